//! End-to-end sync driver
//!
//! One sync is a single logical sequence: classify the request against the
//! cache, page rows out of a scoped source, merge, recompute derived
//! fields, persist. Partial progress is never discarded; recoverable
//! trouble becomes warnings on the outcome instead of errors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::earliest_supported_date;
use crate::error::{Error, Result};
use crate::models::{
    Dataset, FreshnessConfig, QuoteRecord, SyncDecision, SyncOutcome, SyncRequest, SyncStats,
    SyncWarning,
};
use crate::services::cache_store::CacheStore;
use crate::services::freshness;
use crate::services::merger::{merge, Precedence, WindowPolicy};
use crate::services::page_source::{PageProvider, PageSource};

/// Drives sync operations against one cache store and one page provider
///
/// Syncs for the same instrument are serialized on a per-instrument lock;
/// different instruments run concurrently. A sync in progress can be
/// cancelled between pages via the orchestrator's cancellation token.
pub struct SyncOrchestrator<P> {
    store: CacheStore,
    provider: P,
    freshness: FreshnessConfig,
    cancel: CancellationToken,
    locks: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
    today_override: Option<NaiveDate>,
}

impl<P: PageProvider> SyncOrchestrator<P> {
    pub fn new(store: CacheStore, provider: P) -> Self {
        Self {
            store,
            provider,
            freshness: FreshnessConfig::default(),
            cancel: CancellationToken::new(),
            locks: StdMutex::new(HashMap::new()),
            today_override: None,
        }
    }

    pub fn with_freshness(mut self, config: FreshnessConfig) -> Self {
        self.freshness = config;
        self
    }

    /// Pin "today" instead of reading the clock. Used when replaying
    /// historical snapshots and by tests.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    /// Token cancelling in-flight syncs between pages
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    fn instrument_lock(&self, instrument: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks.entry(instrument.to_string()).or_default().clone()
    }

    /// Synchronize the cache for one instrument and return the result
    pub async fn sync(&self, request: SyncRequest) -> Result<SyncOutcome> {
        let instrument = request.instrument.trim().to_uppercase();
        if instrument.is_empty() {
            return Err(Error::InvalidInput(
                "instrument identifier is required".to_string(),
            ));
        }
        if request.desired_rows == 0 {
            return Err(Error::InvalidInput(
                "desired row count must be positive".to_string(),
            ));
        }

        let lock = self.instrument_lock(&instrument);
        let _guard = lock.lock().await;

        let mut warnings = Vec::new();

        let cached = match self.store.load(&instrument) {
            Ok(load) => {
                if load.skipped_rows > 0 {
                    warnings.push(SyncWarning::CacheUnreadable(format!(
                        "{} damaged rows skipped",
                        load.skipped_rows
                    )));
                }
                load.dataset
            }
            Err(e) => {
                warn!(%instrument, error = %e, "Cache unreadable, starting from empty");
                warnings.push(SyncWarning::CacheUnreadable(e.to_string()));
                Dataset::new()
            }
        };

        let today = self.today();
        let decision = freshness::decide(
            &cached.metadata(),
            request.desired_rows,
            today,
            &self.freshness,
        );
        info!(
            %instrument,
            ?decision,
            cached_rows = cached.len(),
            desired = request.desired_rows,
            "Sync classified"
        );

        if decision == SyncDecision::NoFetch {
            return Ok(SyncOutcome {
                dataset: cached,
                decision,
                persisted: false,
                warnings,
                stats: SyncStats::default(),
            });
        }

        let from_date = match decision {
            SyncDecision::FullRefresh => earliest_supported_date(),
            _ => cached.max_date().unwrap_or_else(earliest_supported_date),
        };

        let mut source = match self.provider.acquire(&instrument, from_date).await {
            Ok(source) => source,
            Err(e) => {
                warn!(%instrument, error = %e, "Failed to acquire page source");
                if cached.is_empty() {
                    return Err(Error::NoData(instrument));
                }
                warnings.push(SyncWarning::FetchFailed(e.to_string()));
                return Ok(SyncOutcome {
                    dataset: cached,
                    decision,
                    persisted: false,
                    warnings,
                    stats: SyncStats::default(),
                });
            }
        };

        let (accumulated, stats, mut fetch_warnings) = self
            .fetch_pages(source.as_mut(), &instrument, request.desired_rows)
            .await;
        source.close().await;
        warnings.append(&mut fetch_warnings);

        if accumulated.is_empty() {
            // Nothing usable came back; the previous cache is the best answer.
            if cached.is_empty() {
                return Err(Error::NoData(instrument));
            }
            if !warnings
                .iter()
                .any(|w| matches!(w, SyncWarning::FetchFailed(_) | SyncWarning::Cancelled))
            {
                warnings.push(SyncWarning::FetchFailed(
                    "source yielded no rows".to_string(),
                ));
            }
            return Ok(SyncOutcome {
                dataset: cached,
                decision,
                persisted: false,
                warnings,
                stats,
            });
        }

        let fetch_incomplete = warnings
            .iter()
            .any(|w| matches!(w, SyncWarning::FetchFailed(_) | SyncWarning::Cancelled));

        // A full refresh replaces the cache outright, unless pagination
        // stopped early: a partial refresh must not drop rows the fetch
        // never reached.
        let existing = match decision {
            SyncDecision::FullRefresh if !fetch_incomplete => Dataset::new(),
            _ => cached,
        };

        let mut result = merge(
            existing,
            Dataset::from_records(accumulated),
            Precedence::PreferIncoming,
            WindowPolicy::MostRecent(request.desired_rows),
        );
        result.recompute_changes();

        let persisted = match self.store.save(&instrument, &result) {
            Ok(()) => true,
            Err(e) => {
                warn!(%instrument, error = %e, "Failed to persist sync result");
                warnings.push(SyncWarning::SaveFailed(e.to_string()));
                false
            }
        };

        info!(
            %instrument,
            rows = result.len(),
            pages = stats.pages,
            persisted,
            "Sync complete"
        );

        Ok(SyncOutcome {
            dataset: result,
            decision,
            persisted,
            warnings,
            stats,
        })
    }

    /// Page rows out of the source until the request is covered or the
    /// source runs dry, fails, or is cancelled
    async fn fetch_pages(
        &self,
        source: &mut dyn PageSource,
        instrument: &str,
        desired_rows: usize,
    ) -> (Vec<QuoteRecord>, SyncStats, Vec<SyncWarning>) {
        let mut seen: HashSet<NaiveDate> = HashSet::new();
        let mut accumulated: Vec<QuoteRecord> = Vec::new();
        let mut stats = SyncStats::default();
        let mut warnings = Vec::new();

        while accumulated.len() < desired_rows && source.has_next() {
            if self.cancel.is_cancelled() {
                warn!(instrument, "Sync cancelled between pages");
                warnings.push(SyncWarning::Cancelled);
                break;
            }

            let page = match source.next_page().await {
                Ok(page) => page,
                Err(e) => {
                    warn!(instrument, error = %e, "Page fetch failed, keeping accumulated rows");
                    warnings.push(SyncWarning::FetchFailed(e.to_string()));
                    break;
                }
            };
            stats.pages += 1;

            let mut new_rows = 0usize;
            for raw in &page {
                match raw.parse() {
                    Ok(record) => {
                        stats.fetched_rows += 1;
                        if seen.insert(record.date) {
                            accumulated.push(record);
                            new_rows += 1;
                        }
                    }
                    Err(e) => {
                        warn!(instrument, error = %e, "Skipping malformed row");
                        stats.skipped_rows += 1;
                    }
                }
            }

            // A "next page" control that serves no new content means the
            // end of data, not an infinite tail of identical pages.
            if new_rows == 0 {
                debug!(instrument, page = stats.pages, "Page yielded no new dates, stopping");
                break;
            }
        }

        (accumulated, stats, warnings)
    }
}
