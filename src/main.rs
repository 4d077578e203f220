use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use byline::access::AccessPolicy;
use byline::config::Config;
use byline::nonce::NonceKeeper;
use byline::preferences::RangePreference;
use byline::range::RangeLabel;
use byline::selection::{build_report, RangeSelection, ReportSettings};
use byline::server::{self, AppState};
use byline::storage::Database;

#[derive(Parser, Debug)]
#[command(
    name = "byline",
    about = "Admin report of authors and the articles they published"
)]
struct Args {
    /// Configuration file (TOML). Missing file means defaults.
    #[arg(long, value_name = "FILE", default_value = "byline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the settings page and range endpoint
    Serve {
        /// Listen address, overrides `bind_addr`
        #[arg(long)]
        bind: Option<String>,

        /// SQLite database, overrides `database_path`
        #[arg(long, value_name = "FILE")]
        database: Option<String>,
    },
    /// Print the report fragment to stdout without changing the stored range
    Report {
        /// Range label such as "3 months ago"; defaults to the stored range
        #[arg(long)]
        range: Option<String>,

        /// SQLite database, overrides `database_path`
        #[arg(long, value_name = "FILE")]
        database: Option<String>,
    },
}

async fn open_database(config: &Config, database: Option<String>) -> Result<Database> {
    let path = database.unwrap_or_else(|| config.database_path.clone());
    Database::open(&path)
        .await
        .with_context(|| format!("Failed to open database '{path}'"))
}

async fn run_serve(config: Config, bind: Option<String>, database: Option<String>) -> Result<()> {
    let db = open_database(&config, database).await?;
    let settings = ReportSettings::from_config(&config).context("Invalid site_url")?;
    let secret = config
        .nonce_secret()
        .context("A nonce secret is required to serve the report")?;
    let nonces = NonceKeeper::new(&secret, config.nonce_lifetime_hours)
        .map_err(|e| anyhow::anyhow!("Unusable nonce secret: {e}"))?;

    let policy = AccessPolicy::new(&config.access);
    if config.access.admins.is_empty() {
        tracing::warn!("access.admins is empty; every request will be refused");
    }

    let state = Arc::new(AppState {
        selection: RangeSelection::new(db, nonces, settings),
        policy,
    });

    let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    server::serve(listener, state).await.context("Server error")?;
    Ok(())
}

async fn run_report(config: Config, range: Option<String>, database: Option<String>) -> Result<()> {
    let db = open_database(&config, database).await?;
    let settings = ReportSettings::from_config(&config).context("Invalid site_url")?;

    let range = match range {
        Some(label) => RangeLabel::parse_or_default(&label),
        None => RangePreference::new(db.clone())
            .get()
            .await
            .context("Failed to read the stored range")?,
    };

    let fragment = build_report(&db, &settings, range, Utc::now())
        .await
        .context("Failed to build the author report")?;
    print!("{fragment}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    tracing::debug!(?config, "Effective configuration");

    match args.command {
        Command::Serve { bind, database } => run_serve(config, bind, database).await,
        Command::Report { range, database } => run_report(config, range, database).await,
    }
}
