//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use lexiplan_server::db::{self, migrations, DatabaseConfig};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {}

/// Create or update the schema, then exit
pub async fn run_migrate(_args: MigrateArgs) -> Result<()> {
    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let db = db::connect(config)
        .await
        .context("Failed to connect to the database")?;

    let result = migrations::run(&db).await;
    db.shutdown().await;
    result.context("Failed to run migrations")?;

    println!("Schema is up to date");
    Ok(())
}
