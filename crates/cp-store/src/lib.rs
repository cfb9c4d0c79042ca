//! # cp-store
//!
//! The session's job collection and its local durable cache.
//!
//! The store is the single owner of the in-memory collection. It is shared
//! with the sync engine and the binary through a [`StoreHandle`]; lock
//! guards are never held across an `.await`.
//!
//! Every mutation writes the full collection to the cache under
//! [`JOBS_KEY`]. Cache failures are logged and swallowed.

pub mod cache;
pub mod store;

pub use cache::{CacheError, CacheResult, FileCache, LocalCache, MemoryCache};
pub use store::{ChantierStore, StoreHandle, JOBS_KEY, LOCAL_ID_PREFIX};
