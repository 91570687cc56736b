//! Run a raw SPARQL query

use clap::Args;

use crate::domain::QueryExecutor;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SPARQL query text
    pub text: String,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let services = crate::create_services(&config).await?;

    let rows = services.executor.execute(&args.text).await?;

    super::print_json(&rows)
}
