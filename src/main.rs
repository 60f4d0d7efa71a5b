//! Nutrisys
//!
//! An MCP server for nutrition practice records.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutrisys::build_info;
use nutrisys::calc::{SystemClock, UuidGenerator};
use nutrisys::config::{Config, DEFAULT_LOG_DIRECTIVE};
use nutrisys::db::{self, Database};
use nutrisys::mcp::NutrisysService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let db_path = config.database_path;
    tracing::info!(path = %db_path.display(), "Using database");

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;

    let schema_version = database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        db::migrations::get_schema_version(conn)
    })?;

    build_info::print_startup_banner(&db_path, schema_version);
    tracing::info!("Starting MCP server on stdio");

    let service = NutrisysService::new(
        db_path,
        database,
        Arc::new(UuidGenerator),
        Arc::new(SystemClock),
    );

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
