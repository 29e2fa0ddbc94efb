use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::QuoteRecord;
use crate::utils::round2;

/// Ordered sequence of quote records for one instrument
///
/// Invariant: dates are unique and ascending before derived-field
/// computation and before persistence. Construction through the merger
/// guarantees both; `from_records` sorts but does not deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<QuoteRecord>,
}

/// Shape of the cached dataset, recomputed on every load.
/// Feeds the freshness decision and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetadata {
    pub max_date: Option<NaiveDate>,
    pub row_count: usize,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset from records, sorted ascending by date
    pub fn from_records(mut records: Vec<QuoteRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<QuoteRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuoteRecord> {
        self.records.iter()
    }

    /// Most recent date in the dataset
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    pub fn metadata(&self) -> CacheMetadata {
        CacheMetadata {
            max_date: self.max_date(),
            row_count: self.records.len(),
        }
    }

    /// Recompute `change` and `change_percent` across the whole dataset
    ///
    /// `change[i] = close[i] - close[i-1]`,
    /// `change_percent[i] = change[i] / close[i-1] * 100`, both to 2dp.
    /// The earliest record has no prior close and gets `None`.
    pub fn recompute_changes(&mut self) {
        self.records.sort_by_key(|r| r.date);

        let mut prev_close: Option<f64> = None;
        for record in &mut self.records {
            match prev_close {
                Some(prev) if prev != 0.0 => {
                    let change = record.close - prev;
                    record.change = Some(round2(change));
                    record.change_percent = Some(round2(change / prev * 100.0));
                }
                _ => {
                    record.change = None;
                    record.change_percent = None;
                }
            }
            prev_close = Some(record.close);
        }
    }
}

impl IntoIterator for Dataset {
    type Item = QuoteRecord;
    type IntoIter = std::vec::IntoIter<QuoteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
