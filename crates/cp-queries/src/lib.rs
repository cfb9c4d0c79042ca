//! # cp-queries
//!
//! Query system for Chantier Planner.
//!
//! ## Structure
//!
//! - `filters` - Status, past-job and free-text filters
//! - `sorts` - Sort orders and directions
//! - `hierarchy` - Parent/child grouping and family inclusion for search
//! - `query` - The list pipeline combining all of the above
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use cp_models::{Chantier, Status};
//! use cp_queries::{ChantierFilter, ListQuery};
//!
//! let jobs = vec![
//!     Chantier::new("Roof repair", "2024-03-01", "2024-03-03").with_id("a"),
//!     Chantier::new("Gutters", "2024-03-02", "2024-03-02").with_id("b").with_parent("a"),
//! ];
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!
//! let view = ListQuery::new()
//!     .filter(ChantierFilter::new().status(Status::Ongoing).search("gutter"))
//!     .run(&jobs, today);
//!
//! // the matching child pulls in its parent
//! assert_eq!(view.len(), 2);
//! assert_eq!(view.hierarchy.roots().len(), 1);
//! ```

pub mod filters;
pub mod sorts;
pub mod hierarchy;
pub mod query;

// Re-exports for convenience
pub use filters::ChantierFilter;
pub use hierarchy::{family_inclusion, Hierarchy, HierarchyRow};
pub use query::{ListQuery, ListView};
pub use sorts::{SortDirection, SortKey, SortOrder};
