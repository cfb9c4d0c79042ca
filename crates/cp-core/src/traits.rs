//! Core traits shared by models and stores

use chrono::{DateTime, Utc};

/// Identifier assigned by the remote store (opaque text, e.g. a 24-hex object id)
pub type ChantierId = String;

/// Trait for entities identified by the remote store
pub trait Identifiable {
    fn id(&self) -> Option<&str>;
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

/// Trait for entities with timestamps (created_at, updated_at)
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}
