//! Deduplicating, windowing dataset merge
//!
//! Merge order encodes precedence: the side concatenated first wins any
//! date collision, because deduplication keeps the first occurrence of a
//! date. Call sites must say which side that is.

use std::collections::HashSet;

use crate::models::{Dataset, QuoteRecord};

/// Which side wins when both datasets carry the same date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Previously cached values win over re-fetched ones (stability)
    PreferExisting,

    /// Freshly fetched values win; the most recent cached day may have been
    /// a partial intraday row
    PreferIncoming,
}

/// Truncation applied after the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Keep everything
    All,

    /// Keep only the n most recent dates (output stays ascending)
    MostRecent(usize),
}

/// Merge two datasets into one deduplicated, ascending dataset
///
/// Output is date-unique and sorted ascending regardless of duplicate
/// input dates; `merge(a.clone(), a, _, WindowPolicy::All)` is `a` with
/// duplicates removed.
pub fn merge(
    existing: Dataset,
    incoming: Dataset,
    precedence: Precedence,
    window: WindowPolicy,
) -> Dataset {
    let (first, second) = match precedence {
        Precedence::PreferExisting => (existing, incoming),
        Precedence::PreferIncoming => (incoming, existing),
    };

    let mut seen = HashSet::new();
    let mut records: Vec<QuoteRecord> = first
        .into_iter()
        .chain(second)
        .filter(|record| seen.insert(record.date))
        .collect();

    records.sort_by_key(|r| r.date);

    if let WindowPolicy::MostRecent(n) = window {
        if records.len() > n {
            records = records.split_off(records.len() - n);
        }
    }

    Dataset::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: &str, close: f64) -> QuoteRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        QuoteRecord::new(date, close, close, close, close, 500, 1000, 10)
    }

    fn dates(dataset: &Dataset) -> Vec<String> {
        dataset.iter().map(|r| r.date.to_string()).collect()
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = Dataset::from_records(vec![
            record("2024-01-01", 100.0),
            record("2024-01-02", 105.0),
            record("2024-01-03", 95.0),
        ]);

        let merged = merge(a.clone(), a.clone(), Precedence::PreferExisting, WindowPolicy::All);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_overlap_is_deduplicated_and_sorted() {
        let existing = Dataset::from_records(vec![
            record("2024-01-01", 100.0),
            record("2024-01-02", 105.0),
        ]);
        let incoming = Dataset::from_records(vec![
            record("2024-01-02", 106.0),
            record("2024-01-03", 95.0),
        ]);

        let merged = merge(existing, incoming, Precedence::PreferExisting, WindowPolicy::All);
        assert_eq!(
            dates(&merged),
            vec!["2024-01-01", "2024-01-02", "2024-01-03"]
        );
    }

    #[test]
    fn test_precedence_prefer_existing() {
        let existing = Dataset::from_records(vec![record("2024-01-02", 105.0)]);
        let incoming = Dataset::from_records(vec![record("2024-01-02", 106.0)]);

        let merged = merge(existing, incoming, Precedence::PreferExisting, WindowPolicy::All);
        assert_eq!(merged.records()[0].close, 105.0);
    }

    #[test]
    fn test_precedence_prefer_incoming() {
        let existing = Dataset::from_records(vec![record("2024-01-02", 105.0)]);
        let incoming = Dataset::from_records(vec![record("2024-01-02", 106.0)]);

        let merged = merge(existing, incoming, Precedence::PreferIncoming, WindowPolicy::All);
        assert_eq!(merged.records()[0].close, 106.0);
    }

    #[test]
    fn test_window_keeps_most_recent_ascending() {
        let records: Vec<QuoteRecord> = (0..500)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
                    + chrono::Duration::days(i);
                record(&date.to_string(), 100.0 + i as f64)
            })
            .collect();
        let full = Dataset::from_records(records);
        let newest = full.max_date().unwrap();

        let merged = merge(
            full,
            Dataset::new(),
            Precedence::PreferExisting,
            WindowPolicy::MostRecent(300),
        );

        assert_eq!(merged.len(), 300);
        assert_eq!(merged.max_date().unwrap(), newest);
        // ascending and contiguous from day 200
        let first = merged.records()[0].date;
        assert_eq!(first, newest - chrono::Duration::days(299));
        assert!(merged
            .records()
            .windows(2)
            .all(|pair| pair[0].date < pair[1].date));
    }

    #[test]
    fn test_window_larger_than_dataset_is_noop() {
        let a = Dataset::from_records(vec![record("2024-01-01", 100.0)]);
        let merged = merge(
            a.clone(),
            Dataset::new(),
            Precedence::PreferExisting,
            WindowPolicy::MostRecent(300),
        );
        assert_eq!(merged, a);
    }

    #[test]
    fn test_duplicate_dates_within_one_side() {
        let incoming = Dataset::from_records(vec![
            record("2024-01-01", 100.0),
            record("2024-01-01", 100.5),
            record("2024-01-02", 105.0),
        ]);

        let merged = merge(
            Dataset::new(),
            incoming,
            Precedence::PreferIncoming,
            WindowPolicy::All,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.records()[0].close, 100.0);
    }
}
