//! `doorlock`: the door controller binary.
//!
//! `doorlock run` is the service; the other subcommands inspect and adjust
//! the credential store offline.

mod config;
mod links;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doorlock_core::CardId;
use doorlock_engine::{MainLoop, OutboundSink, ResolutionEngine};
use doorlock_storage::{Database, SqliteCredentialStore, provision};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DeploymentConfig;

#[derive(Parser)]
#[command(name = "doorlock", version, about = "Card reader door controller")]
struct Cli {
    /// Deployment file (TOML). Defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the credential store location.
    #[arg(long, global = true)]
    store: Option<String>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve card presentations until the inbound link closes.
    Run {
        /// Override the inbound device (`-` for stdin).
        #[arg(long)]
        inbound: Option<String>,
    },

    /// List enrolled credentials.
    Cards,

    /// Set or clear the display name of an enrolled card.
    Rename {
        id: CardId,

        #[arg(required_unless_present = "clear")]
        name: Option<String>,

        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Show the newest usage ledger entries.
    Usage {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Only entries for this card.
        #[arg(long)]
        card: Option<CardId>,
    },

    /// Enroll any missing bootstrap cards.
    Provision,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout may be an outbound link, so logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut deployment = DeploymentConfig::load(cli.config.as_deref())
        .context("failed to load deployment configuration")?;
    if let Some(store) = cli.store {
        deployment.store_location = store;
    }

    let database = Database::new(deployment.database_config())
        .await
        .with_context(|| format!("failed to open store at {}", deployment.store_location))?;
    let store = SqliteCredentialStore::new(database.pool().clone());

    let outcome = match cli.command {
        Commands::Run { inbound } => {
            if let Some(device) = inbound {
                deployment.inbound.device = device;
            }
            serve(&deployment, store).await
        }
        Commands::Cards => list_cards(&store).await,
        Commands::Rename { id, name, clear } => {
            let name = if clear { None } else { name };
            store
                .rename(id, name.as_deref())
                .await
                .with_context(|| format!("failed to rename card {id}"))?;
            info!(card_id = %id, name = ?name, "card renamed");
            Ok(())
        }
        Commands::Usage { limit, card } => show_usage(&store, card, limit).await,
        Commands::Provision => {
            let report = provision(&store, &deployment.bootstrap_table()?)
                .await
                .context("bootstrap provisioning failed")?;
            println!(
                "{} created, {} already present",
                report.created_count(),
                report.already_present
            );
            Ok(())
        }
    };

    database.close().await;
    outcome
}

async fn serve(deployment: &DeploymentConfig, store: SqliteCredentialStore) -> Result<()> {
    let engine = ResolutionEngine::start(store, deployment.engine_config()?)
        .await
        .context("failed to start resolution engine")?;

    let (source, sinks) = links::open(deployment).context("failed to open links")?;
    let sinks = sinks
        .into_iter()
        .map(|(sink, send_name)| OutboundSink::new(sink, send_name))
        .collect();

    let mut main_loop = MainLoop::new(
        engine,
        source,
        sinks,
        deployment.inbound_format(),
        deployment.runner_config()?,
    );

    tokio::select! {
        result = main_loop.run() => {
            let stats = result.context("link lost")?;
            info!(?stats, "controller stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            warn!("interrupted, shutting down");
        }
    }

    Ok(())
}

async fn list_cards(store: &SqliteCredentialStore) -> Result<()> {
    let cards = store.list().await.context("failed to list credentials")?;
    for card in &cards {
        let last_used = card
            .last_used
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:>10}  {:<13}  {:<24}  {}",
            card.id.to_string(),
            card.rank.to_string(),
            card.display_name(),
            last_used
        );
    }
    println!("{} credential(s)", cards.len());
    Ok(())
}

async fn show_usage(
    store: &SqliteCredentialStore,
    card: Option<CardId>,
    limit: i64,
) -> Result<()> {
    let entries = store
        .recent_usage(card, limit)
        .await
        .context("failed to read usage ledger")?;
    for entry in &entries {
        println!(
            "{:>6}  {}  {:>10}  {}",
            entry.seq,
            entry.time.to_rfc3339(),
            entry.card_id.to_string(),
            entry.rank
        );
    }
    Ok(())
}
