//! # cp-core
//!
//! Core types, traits, and utilities for Chantier Planner.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases
//! - Core traits (Identifiable, Timestamped)
//! - Date range utilities and the calendar month grid
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod dates;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use dates::{DateRange, DateValue, MonthGrid};
