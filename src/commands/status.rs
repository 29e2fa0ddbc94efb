use chrono::Utc;

use crate::error::Result;
use crate::services::CacheStore;

pub fn run(instrument: Option<String>) {
    match show_status(instrument) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(instrument: Option<String>) -> Result<()> {
    let store = CacheStore::default_location();

    let instruments = match instrument {
        Some(instrument) => vec![instrument.trim().to_uppercase()],
        None => cached_instruments(&store)?,
    };

    if instruments.is_empty() {
        println!("⚠️  No cached data found in {}", store.dir().display());
        println!("   Run 'isxsync sync <INSTRUMENT>' first.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    println!("📊 Cache status ({})\n", store.dir().display());

    for instrument in &instruments {
        let load = store.load(instrument)?;
        let dataset = &load.dataset;

        if dataset.is_empty() {
            println!("🔹 {:<8} (empty)", instrument);
            continue;
        }

        let first = dataset.records().first().map(|r| r.date.to_string());
        let last = dataset.max_date();
        let age = last.map(|d| (today - d).num_days()).unwrap_or(0);

        println!(
            "🔹 {:<8} {:>6} rows  ({} → {})  {} days old{}",
            instrument,
            dataset.len(),
            first.unwrap_or_default(),
            last.map(|d| d.to_string()).unwrap_or_default(),
            age,
            if load.skipped_rows > 0 {
                format!("  ⚠️ {} damaged rows", load.skipped_rows)
            } else {
                String::new()
            }
        );
    }

    Ok(())
}

/// Instruments with a cache file, from the data directory listing
fn cached_instruments(store: &CacheStore) -> Result<Vec<String>> {
    let dir = store.dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut instruments = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                instruments.push(stem.to_string());
            }
        }
    }
    instruments.sort();
    Ok(instruments)
}
