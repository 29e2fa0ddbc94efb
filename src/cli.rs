use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::constants::{DEFAULT_PAGE_SIZE, DEFAULT_ROW_COUNT};

#[derive(Parser)]
#[command(name = "isxsync")]
#[command(about = "Incremental market data sync CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync the cache for one instrument, or --all
    Sync {
        /// Instrument identifier (e.g. BNOI)
        instrument: Option<String>,

        /// Sync every instrument in instrument_group.json
        #[arg(long)]
        all: bool,

        /// Number of most-recent rows to keep
        #[arg(long, default_value_t = DEFAULT_ROW_COUNT)]
        rows: usize,

        /// Snapshot table file serving the raw rows
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Directory of per-instrument snapshot tables (<INSTRUMENT>.csv)
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,

        /// Rows per page served by the snapshot source
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Show cache status
    Status {
        /// Limit to one instrument
        instrument: Option<String>,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            instrument,
            all,
            rows,
            snapshot,
            snapshot_dir,
            page_size,
        } => {
            commands::sync::run(commands::sync::SyncArgs {
                instrument,
                all,
                rows,
                snapshot,
                snapshot_dir,
                page_size,
            })
            .await;
        }
        Commands::Status { instrument } => {
            commands::status::run(instrument);
        }
    }
}
