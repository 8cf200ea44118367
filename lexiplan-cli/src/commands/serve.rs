//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use lexiplan_server::db::{self, migrations, DatabaseConfig};
use lexiplan_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "LEXIPLAN_BIND", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Skip schema migrations on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Run the HTTP server until Ctrl+C/SIGTERM
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;

    tracing::info!("Starting lexiplan server on {}", args.bind);

    let db = db::connect(config)
        .await
        .context("Failed to connect to the database")?;

    if !args.no_migrate {
        migrations::run(&db)
            .await
            .context("Failed to run migrations")?;
    }

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Blocks until shutdown; the pool is closed on the way out
    run_server(db, config).await.context("Server error")?;

    Ok(())
}
