//! Deployment smoke test.
//!
//! Parses the connection string (first CLI argument, falling back to
//! `CLICKHOUSE_URI`), probes the store, then prints the server version,
//! the visible databases, and the tables in the configured database.
//! Exits non-zero on any failure so it can gate a deployment.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use railhouse::{ClickHouseAdapter, HostConfig, QueryOutput};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = HostConfig::from_env();
    let uri = std::env::args()
        .nth(1)
        .or(config.default_uri)
        .context("no connection string: pass one as an argument or set CLICKHOUSE_URI")?;

    smol::block_on(async {
        let adapter = ClickHouseAdapter::new(&uri)?;
        println!("Verifying {}", adapter.display_name());

        adapter.connect().await?;

        let version = adapter.execute("SELECT version()").await?;
        println!("Server version: {}", first_cell(&version));

        let databases = adapter.execute("SHOW DATABASES").await?;
        println!("Databases: {}", first_column(&databases).join(", "));

        let tables = adapter.table_names().await?;
        if tables.is_empty() {
            println!("No tables in the configured database");
        } else {
            println!("Tables: {}", tables.join(", "));
        }

        adapter.disconnect().await?;
        Ok(())
    })
}

/// First cell of the first record, for single-value queries.
fn first_cell(output: &QueryOutput) -> String {
    match output {
        QueryOutput::Records(records) => records
            .first()
            .and_then(|r| r.first_value())
            .map(|v| v.to_display_string())
            .unwrap_or_else(|| "<empty>".to_string()),
        QueryOutput::Raw(value) => value.to_display_string(),
    }
}

/// First value of every record, for listing queries.
fn first_column(output: &QueryOutput) -> Vec<String> {
    match output {
        QueryOutput::Records(records) => records
            .iter()
            .filter_map(|r| r.first_value())
            .map(|v| v.to_display_string())
            .collect(),
        QueryOutput::Raw(_) => vec![],
    }
}
