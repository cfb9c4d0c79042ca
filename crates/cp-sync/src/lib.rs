//! # cp-sync
//!
//! Bridges the job store to the remote store.
//!
//! Single-record operations apply their change locally first, then call the
//! remote store; failures are reported through the [`StatusIndicator`] and
//! never roll the local change back. A reconciliation sweep pushes the
//! cached collection to the remote store, and [`AutoSync`] runs sweeps in
//! the background.
//!
//! ## Structure
//!
//! - `error` - Remote store errors
//! - `remote` - The [`RemoteStore`] seam
//! - `http` - REST implementation over `reqwest`
//! - `memory` - In-memory implementation with failure injection
//! - `status` - The shared status indicator
//! - `operation` - Per-record operation states
//! - `engine` - The sync engine
//! - `autosync` - Periodic background sweeps

pub mod autosync;
pub mod engine;
pub mod error;
pub mod http;
pub mod memory;
pub mod operation;
pub mod remote;
pub mod status;

pub use autosync::{AutoSync, AutoSyncHandle};
pub use engine::{
    LoadSource, RetryPolicy, SaveAllReport, SweepOutcome, SweepReport, SyncEngine,
};
pub use error::{RemoteError, RemoteResult};
pub use http::HttpRemoteStore;
pub use memory::InMemoryRemoteStore;
pub use operation::{OperationKind, OperationLog, OperationRecord, OperationState, HISTORY_LIMIT};
pub use remote::RemoteStore;
pub use status::{StatusIndicator, SyncStatus};
