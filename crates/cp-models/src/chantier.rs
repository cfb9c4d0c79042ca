//! Chantier (job) model and related types
//!
//! A chantier is a scheduled construction job: a date range, a crew, an
//! urgency level and optional parent job for two-level grouping.

pub mod attachments;
pub mod model;
pub(crate) mod wire;

pub use model::*;
