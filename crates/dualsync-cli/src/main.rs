//! DualSync - dual-region object replication
//!
//! Keeps `<bucket>-delhi-backup` in step with every dual-region bucket.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dualsync_core::config::{DualSyncConfig, StorageBackend, StorageConfig};
use dualsync_core::types::{EventOperation, ReplicationEvent};
use dualsync_engine::{offload_from_config, Reconciler};
use dualsync_server::IntakeServer;
use dualsync_storage::{LocalObjectStore, MemoryObjectStore, ObjectStore};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dualsync")]
#[command(author = "DualSync Team")]
#[command(version = dualsync_core::VERSION)]
#[command(about = "Dual-region object replication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DUALSYNC_CONFIG")]
    config: Option<String>,

    /// Port number
    #[arg(short, long, env = "DUALSYNC_PORT")]
    port: Option<u16>,

    /// Data directory for the local backend
    #[arg(long, env = "DUALSYNC_DATA_DIR")]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DUALSYNC_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP intake server
    Server,

    /// Reconcile a single object and print the outcome
    Reconcile {
        /// create, update or delete
        #[arg(long)]
        operation: EventOperation,

        /// Source bucket
        #[arg(long)]
        bucket: String,

        /// Object key
        #[arg(long)]
        key: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        DualSyncConfig::from_file(config_path)?
    } else {
        DualSyncConfig::from_env()
    };

    // Override with CLI args
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir.into();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_logging(&config);

    match cli.command {
        None | Some(Commands::Version) => {
            println!("dualsync {}", dualsync_core::VERSION);
        }
        Some(Commands::Server) => {
            run_server(config).await?;
        }
        Some(Commands::Reconcile {
            operation,
            bucket,
            key,
        }) => {
            let event = ReplicationEvent::new(operation, bucket, key);
            let success = run_once(config, event).await?;
            if !success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(config: &DualSyncConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let fmt_layer = if config.logging.format == "json" {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();
}

async fn build_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalObjectStore::new(&config.data_dir);
            store.init().await?;
            info!("Local backend at {:?}", config.data_dir);
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Memory backend selected; all state is lost on exit");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
    }
}

async fn build_reconciler(config: &DualSyncConfig) -> anyhow::Result<Arc<Reconciler>> {
    let store = build_store(&config.storage).await?;
    let offload = offload_from_config(&config.offload)?;
    match &config.offload.endpoint {
        Some(endpoint) => info!("Large objects offloaded to {}", endpoint),
        None => warn!(
            "No offload endpoint configured; objects at or above the size threshold will fail"
        ),
    }

    Ok(Arc::new(Reconciler::new(
        config.replication.clone(),
        store,
        offload,
    )))
}

async fn run_server(config: DualSyncConfig) -> anyhow::Result<()> {
    info!("Starting DualSync {}...", dualsync_core::VERSION);

    let reconciler = build_reconciler(&config).await?;
    let server = IntakeServer::new(config, reconciler)?;
    server.run().await?;

    Ok(())
}

/// Returns whether the event succeeded
async fn run_once(config: DualSyncConfig, event: ReplicationEvent) -> anyhow::Result<bool> {
    let reconciler = build_reconciler(&config).await?;
    let outcome = reconciler.handle(&event).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.is_success())
}
