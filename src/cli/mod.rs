//! CLI module for Movie Explorer
//!
//! Subcommands:
//! - `cache`: inspect or clear the persistent query cache
//! - `query`: run a SPARQL query through the cache
//! - `similar`: rank films similar to a given one

pub mod cache;
pub mod query;
pub mod similar;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Movie Explorer - cached knowledge-graph queries and film recommendations
#[derive(Parser)]
#[command(name = "movie-explorer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect or clear the query cache
    Cache(cache::CacheArgs),

    /// Run a SPARQL query and print its rows as JSON
    Query(query::QueryArgs),

    /// Print films similar to the described one as JSON
    Similar(similar::SimilarArgs),
}

/// Load `.env` and configuration, then install logging
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Invalid configuration, using defaults: {}", e);
        AppConfig::default()
    });
    logging::init_logging(&config.logging);

    config
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cache_clear() {
        let cli = Cli::try_parse_from(["movie-explorer", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache(cache::CacheArgs {
                action: cache::CacheAction::Clear
            })
        ));
    }

    #[test]
    fn test_parse_similar() {
        let cli = Cli::try_parse_from([
            "movie-explorer",
            "similar",
            "--uri",
            "http://dbpedia.org/resource/Heat_(1995_film)",
            "--release-date",
            "1995-12-15",
            "--subject",
            "Heist films",
            "--subject",
            "American crime films",
            "--limit",
            "5",
        ])
        .unwrap();

        match cli.command {
            Command::Similar(args) => {
                assert_eq!(args.subjects.len(), 2);
                assert_eq!(args.limit, Some(5));
                assert_eq!(args.release_date.as_deref(), Some("1995-12-15"));
            }
            _ => panic!("expected similar command"),
        }
    }

    #[test]
    fn test_parse_query_requires_text() {
        assert!(Cli::try_parse_from(["movie-explorer", "query"]).is_err());
    }
}
