//! Clotho version chain CLI
//!
//! Creates, links and resolves version records against the configured store.
//! Results are printed as JSON on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # First revision
//! clotho-versions create --subject 507f1f77bcf86cd799439011 --user 5f2b6c1e9d3a4b0012c7e8a1 --collection modules
//!
//! # Revision that supersedes the chain containing --previous
//! clotho-versions create --subject 507f191e810c19729de860ea --user 5f2b6c1e9d3a4b0012c7e8a1 \
//!     --collection modules --previous 507f1f77bcf86cd799439011
//!
//! # Newest revision reachable from a subject
//! clotho-versions newest 507f1f77bcf86cd799439011 --collection modules
//!
//! # In-memory store (nothing persisted)
//! CLOTHO_BACKEND=memory clotho-versions stats
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clotho_storage::{connect, DocumentStore, NewVersion, ObjectId, StoreConfig, VersionLedger};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clotho-versions")]
#[command(version, about = "Clotho version chain tool", long_about = None)]
struct Cli {
    /// YAML configuration file (defaults: SQLite `clotho.db`, 1024 hops)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new revision
    Create {
        /// Revision being recorded
        #[arg(long)]
        subject: ObjectId,

        /// User creating the revision
        #[arg(long)]
        user: ObjectId,

        /// Collection of the versioned document
        #[arg(long)]
        collection: String,

        /// Any earlier revision of the same document; the new record continues its chain
        #[arg(long)]
        previous: Option<ObjectId>,

        /// Version number (ignored with --previous)
        #[arg(long, default_value = "1")]
        number: u32,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        application: String,
    },

    /// Mark one revision as replaced by another
    Supersede {
        #[arg(long)]
        previous: ObjectId,

        #[arg(long)]
        replacement: ObjectId,

        #[arg(long)]
        collection: String,
    },

    /// Resolve the newest revision reachable from a subject
    Newest {
        subject: String,

        #[arg(long)]
        collection: String,
    },

    /// List the version records from a subject to the newest revision
    History {
        subject: ObjectId,

        #[arg(long)]
        collection: String,
    },

    /// Document counts per collection
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = load_config(cli.config.as_ref())?;
    let store = connect(&config).context("failed to open document store")?;
    let ledger = VersionLedger::from_config(store.clone(), &config.resolver);

    let outcome = run(cli.command, &ledger, store.as_ref()).await;
    store.close().await.context("failed to close document store")?;
    outcome
}

fn load_config(path: Option<&PathBuf>) -> Result<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::from_yaml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    Ok(config.apply_env_overrides()?)
}

async fn run(command: Commands, ledger: &VersionLedger, store: &dyn DocumentStore) -> Result<()> {
    match command {
        Commands::Create {
            subject,
            user,
            collection,
            previous,
            number,
            description,
            application,
        } => {
            let new = NewVersion::new(subject, user, collection)
                .with_number(number)
                .with_description(description)
                .with_application(application);
            let record = ledger.record_revision(previous, new).await?;
            print_json(&record)
        }
        Commands::Supersede {
            previous,
            replacement,
            collection,
        } => {
            let record = ledger.supersede(previous, replacement, &collection).await?;
            print_json(&record)
        }
        Commands::Newest {
            subject,
            collection,
        } => {
            let newest = ledger.resolver().find_newest(&subject, &collection).await?;
            print_json(&newest)
        }
        Commands::History {
            subject,
            collection,
        } => {
            let history = ledger.resolver().history(subject, &collection).await?;
            print_json(&history)
        }
        Commands::Stats => {
            let stats = store.stats().await?;
            print_json(&stats)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
