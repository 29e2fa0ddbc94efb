//! Cache Format and Policy Constants
//!
//! Defines the on-disk CSV layout of per-instrument cache files and the
//! default freshness thresholds used when no overrides are supplied.

use chrono::NaiveDate;

/// Cache file header, in exact on-disk column order.
pub const CACHE_HEADER: &[&str] = &[
    "Date", "Close", "Open", "High", "Low", "Change", "Change%", "T.Shares", "Volume", "No. Trades",
];

/// Number of columns in a cache file row.
pub const CACHE_COLUMNS: usize = 10;

/// Column indices for the cache CSV format (0-indexed)
pub mod cache_column {
    pub const DATE: usize = 0;
    pub const CLOSE: usize = 1;
    pub const OPEN: usize = 2;
    pub const HIGH: usize = 3;
    pub const LOW: usize = 4;
    pub const CHANGE: usize = 5;
    pub const CHANGE_PERCENT: usize = 6;
    pub const TOTAL_SHARES: usize = 7;
    pub const VOLUME: usize = 8;
    pub const TRADE_COUNT: usize = 9;
}

/// A cache older than this many calendar days is re-scraped from scratch
/// rather than topped up.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 20;

/// A cache missing more than this many rows against the requested count is
/// re-scraped from scratch rather than topped up.
pub const DEFAULT_MAX_ROW_DEFICIT: i64 = 20;

/// Rows requested when the caller does not say otherwise.
pub const DEFAULT_ROW_COUNT: usize = 300;

/// Page size used by the snapshot replay source when none is given.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Earliest date the upstream table supports; full refreshes scrape from here.
pub fn earliest_supported_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid constant date")
}

/// Instrument group file consumed by `sync --all`.
pub const INSTRUMENT_GROUP_FILE: &str = "instrument_group.json";
