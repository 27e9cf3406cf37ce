//! Newsdesk result cache.
//!
//! Keeps normalized content results in memory for a freshness window (five minutes by
//! default) so repeated page loads do not hit the content backend.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! freshness_seconds = 300
//! ```

mod clock;
mod config;
mod keys;
pub(crate) mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::CacheKey;
pub use store::{CacheEntry, MemoryResultCache, NoopResultCache, ResultCache, build_result_cache};

pub use store::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STALE};
