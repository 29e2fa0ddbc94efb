pub mod cache_store;
pub mod freshness;
pub mod merger;
pub mod orchestrator;
pub mod page_source;

pub use cache_store::{CacheLoad, CacheStore};
pub use merger::{merge, Precedence, WindowPolicy};
pub use orchestrator::SyncOrchestrator;
pub use page_source::{
    PageProvider, PageSource, ReplayPageSource, ReplayProvider, SnapshotLocation,
};
