//! In-process session state engine
//!
//! - [`MinHeapScheduler`] orders pending expiries by deadline
//! - [`TtlKeySetStore`] holds per-key sets and counters with sliding expiry
//! - [`Reaper`] periodically evicts keys whose deadline has passed
//!
//! # Example
//!
//! ```rust,no_run
//! use interview_engine::store::TtlKeySetStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = TtlKeySetStore::new();
//!     let reaper = store.start_reaper();
//!
//!     store.add_to_set("interview:42:topics", "dependency-injection");
//!     assert!(store.has("interview:42:topics", "dependency-injection"));
//!
//!     reaper.shutdown().await;
//! }
//! ```

pub mod reaper;
pub mod scheduler;
pub mod ttl_store;
pub mod types;

pub use reaper::{Reaper, ReaperHandle};
pub use scheduler::MinHeapScheduler;
pub use ttl_store::TtlKeySetStore;
pub use types::{
    DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_TTL_MS, KeyedPayload, ScheduledExpiry, StoreConfig,
};
