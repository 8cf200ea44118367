//! lexiplan CLI - vocabulary dictionary and spaced-learning service
//!
//! - `serve`: run the REST API (migrations first)
//! - `migrate`: create or update the database schema
//! - `tokenize`: print the tokens of a sentence as JSON, no database needed
//!
//! Database settings come from `DB_*` environment variables; a `.env` file in
//! the working directory is loaded first.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "lexiplan",
    author,
    version,
    about = "Vocabulary dictionaries, sentence tokenization and word plans over PostgreSQL"
)]
struct Cli {
    /// Debug logging (unless RUST_LOG is set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Split a sentence into tokens and print them as JSON
    Tokenize(commands::tokenize::TokenizeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _telemetry = tracing_setup::init(TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Tokenize(args) => commands::run_tokenize(args),
    }
}
