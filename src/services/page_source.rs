//! Paginated row source abstraction
//!
//! The sync engine never talks to a browser or a network client directly;
//! it consumes row batches from whatever implements [`PageSource`]. A
//! [`PageProvider`] hands out a source scoped to one instrument, and the
//! orchestrator closes it on every exit path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{parse_cell_date, RawQuoteRow};

/// Sequential page retrieval with an explicit end-of-data signal.
/// No assumption about page size.
#[async_trait]
pub trait PageSource: Send {
    /// Whether another page may be available
    fn has_next(&self) -> bool;

    /// Retrieve the next batch of raw rows. Errors are transient from the
    /// caller's point of view: pagination stops, parsed rows are kept.
    async fn next_page(&mut self) -> Result<Vec<RawQuoteRow>>;

    /// Release the underlying session. Invoked on every exit path.
    async fn close(&mut self) {}
}

/// Hands out a [`PageSource`] scoped to one instrument
///
/// `from_date` tells the source how far back it must reach: the earliest
/// supported date on a full refresh, the cached max date on a top-up.
#[async_trait]
pub trait PageProvider: Send + Sync {
    async fn acquire(&self, instrument: &str, from_date: NaiveDate) -> Result<Box<dyn PageSource>>;
}

/// Where a [`ReplayProvider`] finds its snapshot tables
#[derive(Debug, Clone)]
pub enum SnapshotLocation {
    /// One file serving every instrument
    File(PathBuf),

    /// `<dir>/<INSTRUMENT>.csv` per instrument
    Directory(PathBuf),
}

/// Pages through a local snapshot of the upstream table
///
/// The snapshot is a delimited file with the same ten columns the site
/// renders, newest rows first (the order the site serves them), cells in
/// any accepted raw shape. Lets the binary run without a browser.
pub struct ReplayPageSource {
    rows: Vec<RawQuoteRow>,
    cursor: usize,
    page_size: usize,
}

impl ReplayPageSource {
    pub fn from_file(path: &Path, page_size: usize, from_date: NaiveDate) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::Source(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record =
                result.map_err(|e| Error::Source(format!("Unreadable snapshot row: {}", e)))?;
            let row = raw_row_from_record(&record);

            // Honor the from-date filter the way the live page would; rows
            // whose date cell does not parse are passed through for the
            // orchestrator to count as skipped.
            match parse_cell_date(&row.date) {
                Ok(date) if date < from_date => continue,
                _ => rows.push(row),
            }
        }

        debug!(path = %path.display(), rows = rows.len(), %from_date, "Loaded snapshot");

        Ok(Self {
            rows,
            cursor: 0,
            page_size: page_size.max(1),
        })
    }
}

fn raw_row_from_record(record: &csv::StringRecord) -> RawQuoteRow {
    let cell = |i: usize| record.get(i).unwrap_or("").to_string();
    RawQuoteRow {
        date: cell(0),
        close: cell(1),
        open: cell(2),
        high: cell(3),
        low: cell(4),
        change: cell(5),
        change_percent: cell(6),
        total_shares: cell(7),
        volume: cell(8),
        trade_count: cell(9),
    }
}

#[async_trait]
impl PageSource for ReplayPageSource {
    fn has_next(&self) -> bool {
        self.cursor < self.rows.len()
    }

    async fn next_page(&mut self) -> Result<Vec<RawQuoteRow>> {
        let end = (self.cursor + self.page_size).min(self.rows.len());
        let page = self.rows[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(page)
    }
}

/// [`PageProvider`] over local snapshot tables
pub struct ReplayProvider {
    location: SnapshotLocation,
    page_size: usize,
}

impl ReplayProvider {
    pub fn new(location: SnapshotLocation, page_size: usize) -> Self {
        Self {
            location,
            page_size,
        }
    }
}

#[async_trait]
impl PageProvider for ReplayProvider {
    async fn acquire(&self, instrument: &str, from_date: NaiveDate) -> Result<Box<dyn PageSource>> {
        let path = match &self.location {
            SnapshotLocation::File(path) => path.clone(),
            SnapshotLocation::Directory(dir) => {
                dir.join(format!("{}.csv", instrument.trim().to_uppercase()))
            }
        };

        if !path.exists() {
            return Err(Error::NotFound(format!(
                "No snapshot for {} at {}",
                instrument,
                path.display()
            )));
        }

        let source = ReplayPageSource::from_file(&path, self.page_size, from_date)?;
        Ok(Box::new(source))
    }
}
