//! `init-db` command implementation.
//!
//! Creates the readings table ahead of time. The pipeline also creates it
//! on connect, so this mainly serves provisioning and inspection.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InitDbArgs;

/// Execute the `init-db` command
pub async fn run_init_db(args: &InitDbArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(
            crate::error::CliError::config_not_found(args.config.display().to_string()).into(),
        );
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.show_sql {
        println!("{}", persistence::postgres::create_table_sql(&config.storage.table));
        return Ok(());
    }

    let url = config
        .storage
        .effective_database_url()
        .context("No database URL configured (set storage.database_url or DATABASE_URL)")?;

    info!(table = %config.storage.table, "Creating readings table");
    let sink = persistence::PostgresSink::connect(&url, &config.storage.table)
        .await
        .context("Failed to connect to database")?;

    println!("✓ Table '{}' ready", sink.table());
    Ok(())
}
