mod dataset;
mod instrument_group;
mod quote;
mod sync_config;

pub use dataset::{CacheMetadata, Dataset};
pub use instrument_group::InstrumentGroups;
pub use quote::{
    parse_cell_count, parse_cell_date, parse_cell_optional_percent, parse_cell_optional_price,
    parse_cell_price, quote_cells, QuoteRecord, RawQuoteRow,
};
pub use sync_config::{
    FreshnessConfig, SyncDecision, SyncOutcome, SyncRequest, SyncStats, SyncWarning,
};
