//! chaincursor CLI — inspect and advance the sink cursor of a pipeline.
//!
//! Usage:
//! ```bash
//! chaincursor get-cursor   --store mongodb://localhost:27017 --module-hash 3f0a…
//! chaincursor write-cursor --store sqlite:./cursors.db --module-hash 3f0a… \
//!     --latest-block-num 339967540 --latest-block-hash 6xJ…
//! chaincursor info
//! ```

mod logging;

use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use chaincursor_core::{
    CursorConfig, CursorManager, CursorStore, KeyProvider, PipelineKey, StaticKey,
    CONFIRMATION_DEPTH,
};

use crate::logging::{init_tracing, LogConfig};

#[derive(Parser)]
#[command(
    name = "chaincursor",
    about = "Inspect and advance substreams sink cursors",
    long_about = "
Reads and rewrites the persisted cursor of a block-streaming sink.

ENVIRONMENT VARIABLES:
  CHAINCURSOR_STORE        Store URL (memory:, file:<dir>, sqlite:<path>, mongodb://...)
  CHAINCURSOR_MODULE_HASH  Hex hash of the output module the cursor belongs to
  RUST_LOG                 Log filter, overrides --log-level
",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the current cursor
    #[command(name = "get-cursor")]
    GetCursor {
        #[command(flatten)]
        target: Target,
    },

    /// Write the provided block as the current cursor
    #[command(name = "write-cursor")]
    WriteCursor {
        #[command(flatten)]
        target: Target,
        /// Number of the new head block
        #[arg(long)]
        latest_block_num: u64,
        /// Hash / id of the new head block
        #[arg(long)]
        latest_block_hash: String,
    },

    /// Show configuration info
    Info,
}

#[derive(Args)]
struct Target {
    /// Store URL
    #[arg(long, env = "CHAINCURSOR_STORE")]
    store: String,
    /// Hex-encoded output module hash
    #[arg(long, env = "CHAINCURSOR_MODULE_HASH")]
    module_hash: String,
    /// Abort a store call after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Target {
    async fn connect(&self) -> Result<(PipelineKey, CursorManager<Box<dyn CursorStore>>)> {
        let key = PipelineKey::parse(&self.module_hash).context("error loading module hash")?;
        let key = StaticKey::new(key).pipeline_key()?;
        let store = chaincursor_storage::open(&self.store)
            .await
            .with_context(|| format!("error connecting to store {}", self.store))?;
        let config = CursorConfig {
            store_timeout_ms: self.timeout_ms,
            ..Default::default()
        };
        let manager = CursorManager::builder(store).config(config).build()?;
        Ok((key, manager))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.json,
    });

    let outcome = tokio::select! {
        res = run(cli.command) => res,
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted, pending store call aborted")),
    };

    if let Err(e) = outcome {
        error!(error = %format!("{e:#}"), "command failed");
        process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::GetCursor { target } => cmd_get_cursor(target).await,
        Commands::WriteCursor {
            target,
            latest_block_num,
            latest_block_hash,
        } => cmd_write_cursor(target, latest_block_num, latest_block_hash).await,
        Commands::Info => {
            cmd_info();
            Ok(())
        }
    }
}

async fn cmd_get_cursor(target: Target) -> Result<()> {
    let (key, manager) = target.connect().await?;
    let cursor = manager
        .load(key.as_str())
        .await
        .context("failed to load cursor")?;

    info!(
        hash = %key,
        cursor = %cursor,
        block = cursor.block.number,
        "found cursor"
    );
    Ok(())
}

async fn cmd_write_cursor(target: Target, number: u64, hash: String) -> Result<()> {
    let (key, manager) = target.connect().await?;
    let cursor = manager
        .advance_to(key.as_str(), number, hash)
        .await
        .context("failed to write latest cursor")?;

    info!(
        hash = %key,
        cursor = %cursor,
        block = cursor.block.number,
        "wrote cursor"
    );
    Ok(())
}

fn cmd_info() {
    println!("ChainCursor v{}", env!("CARGO_PKG_VERSION"));
    println!("  Confirmation depth: {CONFIRMATION_DEPTH} blocks");
    println!("  LIB id on advance: carried over from the previous cursor");
    println!(
        "  Storage backends: {}",
        chaincursor_storage::available_backends().join(", ")
    );
}
