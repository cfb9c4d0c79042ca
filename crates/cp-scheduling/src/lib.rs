//! # cp-scheduling
//!
//! Calendar placement and drag-reschedule arithmetic.
//!
//! Everything here is pure: functions take jobs and dates and return new
//! values. Applying a reschedule to the store and the remote is the sync
//! engine's job.

pub mod calendar;
pub mod placement;
pub mod reschedule;

pub use calendar::{CalendarCell, CalendarMonth};
pub use placement::{is_working_day, jobs_on_day};
pub use reschedule::{reschedule_by_drag, DragDrop, DragSession};
