use std::path::PathBuf;

use crate::models::{InstrumentGroups, SyncRequest};
use crate::services::{CacheStore, ReplayProvider, SnapshotLocation, SyncOrchestrator};
use crate::utils::get_data_dir;

pub struct SyncArgs {
    pub instrument: Option<String>,
    pub all: bool,
    pub rows: usize,
    pub snapshot: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
    pub page_size: usize,
}

pub async fn run(args: SyncArgs) {
    let location = match (&args.snapshot, &args.snapshot_dir) {
        (Some(_), Some(_)) => {
            eprintln!("❌ Use either --snapshot or --snapshot-dir, not both");
            std::process::exit(1);
        }
        (Some(file), None) => SnapshotLocation::File(file.clone()),
        (None, Some(dir)) => SnapshotLocation::Directory(dir.clone()),
        // Default: per-instrument snapshots next to the cache
        (None, None) => SnapshotLocation::Directory(get_data_dir().join("snapshots")),
    };

    let instruments = if args.all {
        match InstrumentGroups::load_default() {
            Ok(groups) => groups.all_instruments(),
            Err(e) => {
                eprintln!("❌ Failed to load instrument groups: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match &args.instrument {
            Some(instrument) => vec![instrument.clone()],
            None => {
                eprintln!("❌ Give an instrument identifier, or use --all");
                std::process::exit(1);
            }
        }
    };

    let provider = ReplayProvider::new(location, args.page_size);
    let orchestrator = SyncOrchestrator::new(CacheStore::default_location(), provider);

    let total = instruments.len();
    let mut failed = 0usize;

    for (i, instrument) in instruments.iter().enumerate() {
        let request = SyncRequest::new(instrument.clone(), args.rows);

        match orchestrator.sync(request).await {
            Ok(outcome) => {
                println!(
                    "✅ [{}/{}] {} | {:?} | {} rows | {} pages{}",
                    i + 1,
                    total,
                    instrument,
                    outcome.decision,
                    outcome.dataset.len(),
                    outcome.stats.pages,
                    if outcome.persisted { "" } else { " | NOT persisted" }
                );
                for warning in &outcome.warnings {
                    println!("   ⚠️  {}", warning);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("❌ [{}/{}] {} | {}", i + 1, total, instrument, e);
            }
        }
    }

    if failed > 0 {
        eprintln!("\n❌ {} of {} instruments failed", failed, total);
        std::process::exit(1);
    }
}
