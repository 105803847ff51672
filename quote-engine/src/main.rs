//! quote-engine operator tool
//!
//! Commands:
//! - `quote-engine migrate` - apply database migrations
//! - `quote-engine show <number>` - print a quote as JSON
//! - `quote-engine render <number> --out <file>` - write the PDF
//! - `quote-engine issue <number> [--bcc <addr>]` - issue and email

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quote_engine::render::DocumentRenderer;
use quote_engine::store::PgQuoteStore;
use quote_engine::{Config, QuoteService, ServiceSettings, SystemClock};
use shared::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

/// Quote engine operator tool
#[derive(Parser)]
#[command(name = "quote-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Print a quote with its validity as JSON
    Show { quote_number: String },

    /// Render a quote to a PDF file
    Render {
        quote_number: String,
        /// Output path (defaults to quote-<number>.pdf)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Issue a quote and email it to the customer
    Issue {
        quote_number: String,
        /// Extra BCC recipients
        #[arg(long)]
        bcc: Vec<String>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quote_engine=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if cli.database_url.is_some() {
        config.database_url = cli.database_url;
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    let store = PgQuoteStore::connect(database_url, config.database_max_connections)
        .await
        .context("connecting to PostgreSQL")?;

    if let Commands::Migrate = cli.command {
        store.migrate().await.context("applying migrations")?;
        tracing::info!("Migrations applied");
        return Ok(());
    }

    let service = QuoteService::new(
        Arc::new(store),
        Arc::new(SystemClock),
        DocumentRenderer::new(config.branding()),
        ServiceSettings {
            token_ttl: config.token_ttl(),
            links: config.links(),
            email: config.email_settings(),
            default_bcc: config.default_bcc.clone(),
        },
    );

    match cli.command {
        Commands::Migrate => {}
        Commands::Show { quote_number } => {
            let view = service.find(&quote_number).await.map_err(report)?;
            let out = serde_json::json!({
                "quote": view.quote,
                "valid_until": view.validity.valid_until,
                "display_status": view.validity.status,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Render { quote_number, out } => {
            let document = service.render_quote(&quote_number).await.map_err(report)?;
            let path = out.unwrap_or_else(|| PathBuf::from(&document.file_name));
            tokio::fs::write(&path, &document.bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                pages = document.page_count,
                "Quote document written"
            );
        }
        Commands::Issue { quote_number, bcc } => {
            let outcome = service
                .issue_and_send(&quote_number, &bcc)
                .await
                .map_err(report)?;
            match outcome.delivery {
                Ok(receipt) => println!(
                    "{} issued (revision {}) and sent via {}",
                    outcome.quote.quote_number, outcome.quote.revision, receipt.provider
                ),
                Err(e) => {
                    println!(
                        "{} issued (revision {}) but the email was not sent: {e}",
                        outcome.quote.quote_number, outcome.quote.revision
                    );
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}

/// Convert a workflow error into its coded form for display
fn report(e: quote_engine::ServiceError) -> anyhow::Error {
    let app: AppError = e.into();
    match app.details.as_ref().and_then(|d| serde_json::to_string(d).ok()) {
        Some(details) => anyhow::anyhow!("[{}] {} {details}", app.code, app.message),
        None => anyhow::anyhow!("[{}] {}", app.code, app.message),
    }
}
