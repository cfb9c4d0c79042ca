//! Shared sync status indicator
//!
//! One indicator per session. Terminal states clear back to
//! [`SyncStatus::Idle`] after a delay unless a newer status replaced them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cp_core::config::StatusConfig;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    InProgress(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl SyncStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            SyncStatus::Idle => None,
            SyncStatus::InProgress(m)
            | SyncStatus::Success(m)
            | SyncStatus::Warning(m)
            | SyncStatus::Error(m) => Some(m),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SyncStatus::Idle)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::InProgress(_) => "in_progress",
            SyncStatus::Success(_) => "success",
            SyncStatus::Warning(_) => "warning",
            SyncStatus::Error(_) => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "[{}] {}", self.kind(), message),
            None => write!(f, "[{}]", self.kind()),
        }
    }
}

/// Publishes [`SyncStatus`] changes to any number of subscribers
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    tx: Arc<watch::Sender<SyncStatus>>,
    generation: Arc<AtomicU64>,
    success_clear: Duration,
    error_clear: Duration,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(5000))
    }
}

impl StatusIndicator {
    pub fn new(success_clear: Duration, error_clear: Duration) -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            success_clear,
            error_clear,
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(
            Duration::from_millis(config.success_clear_ms),
            Duration::from_millis(config.error_clear_ms),
        )
    }

    pub fn current(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    pub fn in_progress(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(status = "in_progress", %message);
        self.publish(SyncStatus::InProgress(message));
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = "success", %message);
        self.publish(SyncStatus::Success(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(status = "warning", %message);
        self.publish(SyncStatus::Warning(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(status = "error", %message);
        self.publish(SyncStatus::Error(message));
    }

    pub fn clear(&self) {
        self.publish(SyncStatus::Idle);
    }

    fn clear_delay(&self, status: &SyncStatus) -> Option<Duration> {
        match status {
            SyncStatus::Success(_) | SyncStatus::Warning(_) => Some(self.success_clear),
            SyncStatus::Error(_) => Some(self.error_clear),
            SyncStatus::Idle | SyncStatus::InProgress(_) => None,
        }
    }

    fn publish(&self, status: SyncStatus) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.clear_delay(&status);
        self.tx.send_replace(status);

        let Some(delay) = delay else {
            return;
        };
        // outside a runtime the status simply stays until replaced
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let tx = Arc::clone(&self.tx);
        let current = Arc::clone(&self.generation);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                tx.send_replace(SyncStatus::Idle);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_runtime_stays() {
        let indicator = StatusIndicator::default();
        indicator.error("Erreur de synchronisation. Mode hors ligne activé.");
        assert!(indicator.current().is_error());
        assert_eq!(
            indicator.current().to_string(),
            "[error] Erreur de synchronisation. Mode hors ligne activé."
        );
    }

    #[tokio::test]
    async fn test_terminal_status_auto_clears() {
        let indicator =
            StatusIndicator::new(Duration::from_millis(20), Duration::from_millis(40));
        let mut rx = indicator.subscribe();

        indicator.success("Synchronisé avec succès");
        assert_eq!(
            indicator.current(),
            SyncStatus::Success("Synchronisé avec succès".into())
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(indicator.current().is_idle());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_idle());
    }

    #[tokio::test]
    async fn test_newer_status_is_not_cleared_by_older_timer() {
        let indicator =
            StatusIndicator::new(Duration::from_millis(20), Duration::from_millis(20));

        indicator.success("Chantier mis à jour");
        indicator.in_progress("Synchronisation en cours...");
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(
            indicator.current(),
            SyncStatus::InProgress("Synchronisation en cours...".into())
        );
    }
}
