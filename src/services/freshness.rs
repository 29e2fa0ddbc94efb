//! Staleness classification for sync requests
//!
//! Pagination against the upstream table is expensive, so a small gap is
//! patched incrementally while a large one triggers a re-scrape from the
//! earliest supported date: after enough elapsed days the cached rows can
//! no longer be trusted to line up with the source (corporate actions,
//! restated rows).

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{CacheMetadata, FreshnessConfig, SyncDecision};

/// Classify a sync request against the cached dataset's shape
///
/// Rules, in order:
/// 1. empty cache: full refresh
/// 2. cache older than `max_age_days` or more than `max_deficit` rows short
///    of the request: full refresh
/// 3. cache already has today's date and enough rows: no fetch
/// 4. otherwise: incremental top-up of the recent gap
pub fn decide(
    meta: &CacheMetadata,
    desired_rows: usize,
    today: NaiveDate,
    config: &FreshnessConfig,
) -> SyncDecision {
    let max_date = match meta.max_date {
        Some(date) if meta.row_count > 0 => date,
        _ => return SyncDecision::FullRefresh,
    };

    let age_days = (today - max_date).num_days();
    let deficit = desired_rows as i64 - meta.row_count as i64;

    let decision = if age_days > config.max_age_days || deficit > config.max_deficit {
        SyncDecision::FullRefresh
    } else if age_days <= 0 && deficit <= 0 {
        SyncDecision::NoFetch
    } else {
        SyncDecision::IncrementalTopUp
    };

    debug!(
        age_days,
        deficit,
        rows = meta.row_count,
        ?decision,
        "Freshness decision"
    );

    decision
}
