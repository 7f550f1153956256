use clap::{Parser, Subcommand};
use course_ledger::application::engine::LedgerEngine;
use course_ledger::config::{DEFAULT_BIND, EngineConfig, ServerConfig};
use course_ledger::domain::ports::LedgerStoreBox;
use course_ledger::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use course_ledger::infrastructure::rocksdb::RocksDBStore;
use course_ledger::interfaces::csv::event_reader::EventReader;
use course_ledger::interfaces::csv::wallet_writer::WalletWriter;
use course_ledger::interfaces::http;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Platform commission as a percentage of each sale, e.g. 20 or 17.5
    #[arg(long, global = true, env = "LEDGER_COMMISSION_PERCENT", default_value = "20")]
    commission_percent: Decimal,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "LEDGER_DB_PATH")]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay an event CSV and print the final wallet balances
    Replay {
        /// Input events CSV file
        input: PathBuf,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "LEDGER_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(db_path)?;
        return Ok(Box::new(store));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }

    Ok(Box::new(InMemoryLedgerStore::new()))
}

async fn replay(engine: LedgerEngine, input: PathBuf) -> Result<()> {
    let file = File::open(input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for (row, event) in reader.events().enumerate() {
        match event {
            Ok(event) => {
                if let Err(err) = engine.apply_event(event).await {
                    tracing::warn!(row = row + 1, kind = err.kind(), %err, "event rejected");
                }
            }
            Err(err) => {
                tracing::warn!(row = row + 1, %err, "unreadable event");
            }
        }
    }

    let wallets = engine.into_results().await?;

    let stdout = io::stdout();
    let mut writer = WalletWriter::new(stdout.lock());
    writer.write_wallets(wallets).into_diagnostic()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_percent(cli.commission_percent)?;
    let engine = LedgerEngine::with_config(open_store(cli.db_path)?, config);

    match cli.command {
        Command::Replay { input } => replay(engine, input).await,
        Command::Serve { bind } => {
            http::serve(Arc::new(engine), ServerConfig { bind }).await?;
            Ok(())
        }
    }
}
