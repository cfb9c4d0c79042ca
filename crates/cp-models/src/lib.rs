//! # cp-models
//!
//! Domain models for Chantier Planner.
//!
//! The wire format of the remote store is loose: numbers arrive as strings,
//! attachments as JSON-encoded text, empty strings stand in for "no value".
//! Everything here normalizes on ingestion so the rest of the workspace
//! only sees the tidy shapes.

pub use cp_core::traits::{ChantierId, Identifiable, Timestamped};

pub mod chantier;
pub mod status;
pub mod urgency;

pub use chantier::attachments::{ImageAttachment, PdfAttachment};
pub use chantier::model::{is_object_id, Chantier};
pub use status::Status;
pub use urgency::Urgency;
