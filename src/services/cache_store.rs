//! Per-instrument CSV cache
//!
//! One flat file per instrument under the data directory. Loads are
//! tolerant: a missing file is an empty dataset, a damaged file never
//! blocks a fresh fetch. Saves go through a temporary sibling and a rename
//! so a crash mid-write leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{cache_column, CACHE_COLUMNS, CACHE_HEADER};
use crate::error::{Error, Result};
use crate::models::{quote_cells, Dataset, QuoteRecord};
use crate::utils::get_data_dir;

/// Result of loading one cache file
#[derive(Debug, Clone)]
pub struct CacheLoad {
    pub dataset: Dataset,

    /// Rows present in the file but dropped as unparsable
    pub skipped_rows: usize,
}

/// Load/save datasets keyed by instrument, one CSV file per instrument
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `$ISXSYNC_DATA_DIR` (default `market_data/`)
    pub fn default_location() -> Self {
        Self::new(get_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file path for an instrument (`<DIR>/<INSTRUMENT>.csv`)
    pub fn cache_path(&self, instrument: &str) -> PathBuf {
        self.dir
            .join(format!("{}.csv", instrument.trim().to_uppercase()))
    }

    /// Load the cached dataset for an instrument
    ///
    /// A missing file is an empty dataset, not an error. Unparsable rows are
    /// skipped and counted. Only file-level I/O failures return `Err`.
    pub fn load(&self, instrument: &str) -> Result<CacheLoad> {
        let path = self.cache_path(instrument);
        if !path.exists() {
            debug!(instrument, "No cache file, starting empty");
            return Ok(CacheLoad {
                dataset: Dataset::new(),
                skipped_rows: 0,
            });
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut records = Vec::new();
        let mut skipped_rows = 0usize;

        for result in reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(instrument, error = %e, "Skipping unreadable cache row");
                    skipped_rows += 1;
                    continue;
                }
            };

            match parse_cache_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(instrument, error = %e, "Skipping malformed cache row");
                    skipped_rows += 1;
                }
            }
        }

        debug!(
            instrument,
            rows = records.len(),
            skipped = skipped_rows,
            "Loaded cache file"
        );

        Ok(CacheLoad {
            dataset: Dataset::from_records(records),
            skipped_rows,
        })
    }

    /// Persist a dataset for an instrument
    ///
    /// Writes to a `.tmp` sibling and renames over the target, so a failed
    /// write never corrupts the previous cache file.
    pub fn save(&self, instrument: &str, dataset: &Dataset) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", self.dir.display(), e)))?;

        let path = self.cache_path(instrument);
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", tmp_path.display(), e)))?;

        writer
            .write_record(CACHE_HEADER)
            .map_err(|e| Error::Io(format!("Failed to write header: {}", e)))?;

        for record in dataset.iter() {
            writer
                .write_record(&quote_cells(record))
                .map_err(|e| Error::Io(format!("Failed to write record: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| Error::Io(format!("Failed to flush {}: {}", tmp_path.display(), e)))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| {
            Error::Io(format!(
                "Failed to move {} into place: {}",
                tmp_path.display(),
                e
            ))
        })?;

        debug!(instrument, rows = dataset.len(), path = %path.display(), "Saved cache file");
        Ok(())
    }
}

fn parse_cache_row(row: &csv::StringRecord) -> Result<QuoteRecord> {
    if row.len() != CACHE_COLUMNS {
        return Err(Error::Parse(format!(
            "Expected {} fields, got {}",
            CACHE_COLUMNS,
            row.len()
        )));
    }

    use crate::models::{
        parse_cell_count, parse_cell_date, parse_cell_optional_percent, parse_cell_optional_price,
        parse_cell_price,
    };

    let mut record = QuoteRecord::new(
        parse_cell_date(&row[cache_column::DATE])?,
        parse_cell_price(&row[cache_column::OPEN])?,
        parse_cell_price(&row[cache_column::HIGH])?,
        parse_cell_price(&row[cache_column::LOW])?,
        parse_cell_price(&row[cache_column::CLOSE])?,
        parse_cell_count(&row[cache_column::TOTAL_SHARES])?,
        parse_cell_count(&row[cache_column::VOLUME])?,
        parse_cell_count(&row[cache_column::TRADE_COUNT])?,
    );
    record.change = parse_cell_optional_price(&row[cache_column::CHANGE])?;
    record.change_percent = parse_cell_optional_percent(&row[cache_column::CHANGE_PERCENT])?;
    Ok(record)
}
