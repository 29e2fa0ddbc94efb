use crate::constants::{DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_ROW_DEFICIT, DEFAULT_ROW_COUNT};
use crate::models::Dataset;

/// Input to one sync operation
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Instrument identifier keying one cache file (free-form token)
    pub instrument: String,

    /// Number of most-recent rows the caller wants
    pub desired_rows: usize,
}

impl SyncRequest {
    pub fn new(instrument: impl Into<String>, desired_rows: usize) -> Self {
        Self {
            instrument: instrument.into(),
            desired_rows,
        }
    }
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            desired_rows: DEFAULT_ROW_COUNT,
        }
    }
}

/// Freshness thresholds; policy constants, not invariants of the algorithm
#[derive(Debug, Clone, Copy)]
pub struct FreshnessConfig {
    /// Cache older than this many calendar days forces a full refresh
    pub max_age_days: i64,

    /// Cache missing more than this many rows forces a full refresh
    pub max_deficit: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            max_deficit: DEFAULT_MAX_ROW_DEFICIT,
        }
    }
}

/// How a sync request is served. Lives only for the duration of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Cache missing, too stale, or too small: re-scrape from the earliest
    /// supported date
    FullRefresh,

    /// Cache is usable: fetch only enough recent pages to cover the gap,
    /// then merge with the existing cache
    IncrementalTopUp,

    /// Cache already holds today's date and enough rows: no fetch at all
    NoFetch,
}

/// Recoverable conditions surfaced on the outcome rather than as errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWarning {
    /// Cache file existed but could not be read; treated as empty
    CacheUnreadable(String),

    /// Pagination stopped early; accumulated pages were kept
    FetchFailed(String),

    /// Sync was cancelled between pages; partial progress was kept
    Cancelled,

    /// Result could not be persisted; the in-memory dataset is still valid
    SaveFailed(String),
}

impl std::fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncWarning::CacheUnreadable(detail) => {
                write!(f, "cache unreadable, starting from empty: {}", detail)
            }
            SyncWarning::FetchFailed(detail) => {
                write!(f, "pagination stopped early: {}", detail)
            }
            SyncWarning::Cancelled => write!(f, "sync cancelled between pages"),
            SyncWarning::SaveFailed(detail) => {
                write!(f, "result not persisted: {}", detail)
            }
        }
    }
}

/// Counters for one sync operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Pages retrieved from the source
    pub pages: usize,

    /// Rows parsed into records
    pub fetched_rows: usize,

    /// Malformed rows skipped during parsing
    pub skipped_rows: usize,
}

/// Result of one sync operation
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The merged, windowed, derived-field-complete dataset
    pub dataset: Dataset,

    /// How the request was classified
    pub decision: SyncDecision,

    /// Whether the dataset reached disk
    pub persisted: bool,

    /// Recoverable conditions encountered along the way
    pub warnings: Vec<SyncWarning>,

    /// Fetch counters
    pub stats: SyncStats,
}

impl SyncOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
