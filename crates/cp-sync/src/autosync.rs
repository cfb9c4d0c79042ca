//! Periodic background sweeps

use std::sync::Arc;
use std::time::Duration;

use cp_core::config::AppConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;

/// Runs a sweep shortly after start, then every `interval`
#[derive(Debug, Clone)]
pub struct AutoSync {
    engine: Arc<SyncEngine>,
    initial_delay: Duration,
    interval: Duration,
}

impl AutoSync {
    pub fn new(engine: Arc<SyncEngine>, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            engine,
            initial_delay,
            interval,
        }
    }

    pub fn from_config(engine: Arc<SyncEngine>, config: &AppConfig) -> Self {
        Self::new(engine, config.sync_initial_delay(), config.sync_interval())
    }

    /// Start the loop on the current runtime
    pub fn spawn(self) -> AutoSyncHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let AutoSync {
            engine,
            initial_delay,
            interval,
        } = self;

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(initial_delay) => {}
                _ = shutdown_rx.changed() => return,
            }

            info!(interval_secs = interval.as_secs(), "Auto-sync started");
            let outcome = engine.sync_with_backend().await;
            debug!(?outcome, "Initial sweep finished");

            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if engine.is_syncing() {
                            debug!("Sweep still running, tick skipped");
                            continue;
                        }
                        let outcome = engine.sync_with_backend().await;
                        debug!(?outcome, "Periodic sweep finished");
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("Auto-sync stopped");
        });

        AutoSyncHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Stops the loop when shut down or dropped
#[derive(Debug)]
pub struct AutoSyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AutoSyncHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop and wait for a running sweep to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "Auto-sync task ended abnormally");
        }
    }
}
