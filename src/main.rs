use clap::Parser;
use movie_explorer::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Cache(args) => cli::cache::run(args).await,
        Command::Query(args) => cli::query::run(args).await,
        Command::Similar(args) => cli::similar::run(args).await,
    }
}
