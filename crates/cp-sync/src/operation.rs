//! Per-record operation states
//!
//! Every remote call made on behalf of a record goes `Pending` then one of
//! `Confirmed`, `NotFound` or `Failed`. The log keeps the most recent
//! [`HISTORY_LIMIT`] records per job id, and only the last one once the
//! record is gone.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cp_core::traits::ChantierId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Records kept per job id
pub const HISTORY_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Reschedule,
    /// Bulk save of a cached record
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum OperationState {
    Pending,
    Confirmed,
    /// The server no longer knows the record
    NotFound,
    Failed(String),
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub job_id: ChantierId,
    pub kind: OperationKind,
    pub state: OperationState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct OperationLog {
    entries: Mutex<HashMap<ChantierId, Vec<OperationRecord>>>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, job_id: &str, kind: OperationKind, state: OperationState) {
        let record = OperationRecord {
            job_id: job_id.to_string(),
            kind,
            state,
            at: Utc::now(),
        };
        let mut entries = self.entries.lock();
        let history = entries.entry(job_id.to_string()).or_default();
        history.push(record);
        trim(history);
    }

    pub fn begin(&self, job_id: &str, kind: OperationKind) {
        self.record(job_id, kind, OperationState::Pending);
    }

    /// All records for `job_id`, oldest first
    pub fn history(&self, job_id: &str) -> Vec<OperationRecord> {
        self.entries.lock().get(job_id).cloned().unwrap_or_default()
    }

    pub fn latest(&self, job_id: &str) -> Option<OperationRecord> {
        self.entries
            .lock()
            .get(job_id)
            .and_then(|records| records.last().cloned())
    }

    /// Move the history of a placeholder id to the server-assigned id
    pub fn rekey(&self, old_id: &str, new_id: &str) {
        let mut entries = self.entries.lock();
        let Some(mut moved) = entries.remove(old_id) else {
            return;
        };
        for record in &mut moved {
            record.job_id = new_id.to_string();
        }
        let history = entries.entry(new_id.to_string()).or_default();
        history.extend(moved);
        trim(history);
    }

    /// Keep only the last record of a job that no longer exists
    pub fn retire(&self, job_id: &str) {
        if let Some(history) = self.entries.lock().get_mut(job_id) {
            let keep_from = history.len().saturating_sub(1);
            history.drain(..keep_from);
        }
    }

    /// Drop every record of `job_id`
    pub fn forget(&self, job_id: &str) {
        self.entries.lock().remove(job_id);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn trim(history: &mut Vec<OperationRecord>) {
    if history.len() > HISTORY_LIMIT {
        let excess = history.len() - HISTORY_LIMIT;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_and_latest() {
        let log = OperationLog::new();
        log.begin("a", OperationKind::Update);
        log.record("a", OperationKind::Update, OperationState::NotFound);

        let states: Vec<_> = log.history("a").into_iter().map(|r| r.state).collect();
        assert_eq!(states, vec![OperationState::Pending, OperationState::NotFound]);
        assert!(log.latest("a").unwrap().state.is_terminal());
        assert!(log.latest("b").is_none());
    }

    #[test]
    fn test_rekey_moves_history() {
        let log = OperationLog::new();
        log.begin("local-1-0", OperationKind::Create);
        log.record("local-1-0", OperationKind::Create, OperationState::Confirmed);
        log.rekey("local-1-0", "65f1c2a9e4b0a1b2c3d4e5f6");

        assert!(log.history("local-1-0").is_empty());
        let moved = log.history("65f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(moved.len(), 2);
        assert!(moved.iter().all(|r| r.job_id == "65f1c2a9e4b0a1b2c3d4e5f6"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_history_is_capped() {
        let log = OperationLog::new();
        for _ in 0..100 {
            log.begin("a", OperationKind::Update);
            log.record("a", OperationKind::Update, OperationState::Confirmed);
        }
        log.record("a", OperationKind::Update, OperationState::NotFound);

        let history = log.history("a");
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.last().unwrap().state, OperationState::NotFound);
    }

    #[test]
    fn test_retire_and_forget() {
        let log = OperationLog::new();
        log.begin("a", OperationKind::Delete);
        log.record("a", OperationKind::Delete, OperationState::Confirmed);
        log.begin("b", OperationKind::Create);

        log.retire("a");
        assert_eq!(log.history("a").len(), 1);
        assert_eq!(log.latest("a").unwrap().state, OperationState::Confirmed);

        log.forget("b");
        assert!(log.latest("b").is_none());
        assert_eq!(log.len(), 1);
    }
}
