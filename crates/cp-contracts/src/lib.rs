//! # cp-contracts
//!
//! Contract validation for Chantier Planner.
//!
//! Contracts run before any request is sent: a record that fails its
//! contract never reaches the remote store or the local collection.

pub mod base;
pub mod chantiers;

pub use base::*;
pub use chantiers::{CreateChantierContract, UpdateChantierContract};
