//! Sync engine
//!
//! Record operations are optimistic: the store changes first, the remote
//! call follows, and a failed call leaves the local change in place and
//! marks the session as having unsaved changes. The sweep
//! ([`SyncEngine::sync_with_backend`]) then pushes the local collection to
//! the remote store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cp_contracts::{Contract, CreateChantierContract, UpdateChantierContract};
use cp_core::config::{AppConfig, SyncConfig};
use cp_core::result::NotFoundExt;
use cp_core::traits::ChantierId;
use cp_core::{PlanError, PlanResult};
use cp_models::Chantier;
use cp_scheduling::DragDrop;
use cp_store::{StoreHandle, LOCAL_ID_PREFIX};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::error::RemoteError;
use crate::operation::{OperationKind, OperationLog, OperationState};
use crate::remote::RemoteStore;
use crate::status::StatusIndicator;

const NOT_FOUND_REMOVED: &str = "Chantier not found on server, removed locally";

/// Fetch retries for the sweep: `max_retries` more attempts after the
/// first, `delay` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Where [`SyncEngine::initial_load`] got the collection from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote(usize),
    Cache(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub succeeded: usize,
    pub attempted: usize,
}

impl SweepReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Every operation succeeded (including a sweep with nothing to do)
    Full(SweepReport),
    Partial(SweepReport),
    /// Operations were attempted and none succeeded
    Failed(SweepReport),
    /// The remote collection could not be fetched
    Offline { attempts: u32 },
    /// Another sweep was already running
    Skipped,
}

impl SweepOutcome {
    pub fn report(&self) -> Option<SweepReport> {
        match self {
            SweepOutcome::Full(r) | SweepOutcome::Partial(r) | SweepOutcome::Failed(r) => {
                Some(*r)
            }
            SweepOutcome::Offline { .. } | SweepOutcome::Skipped => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, SweepOutcome::Full(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveAllReport {
    pub saved: usize,
    /// Unknown to the server and created again under a new id
    pub recreated: usize,
    /// No id, or not a document-store id
    pub skipped: usize,
    pub failures: Vec<(ChantierId, String)>,
}

impl SaveAllReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum SaveResult {
    Saved,
    Recreated,
    Failed(String),
}

/// Clears the "is syncing" flag when the sweep ends, however it ends
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

pub struct SyncEngine {
    store: StoreHandle,
    remote: Arc<dyn RemoteStore>,
    status: StatusIndicator,
    log: OperationLog,
    retry: RetryPolicy,
    roster: Option<Vec<String>>,
    syncing: AtomicBool,
    unsaved: AtomicBool,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("remote", &self.remote.name())
            .field("retry", &self.retry)
            .field("syncing", &self.is_syncing())
            .field("unsaved", &self.has_unsaved_changes())
            .finish()
    }
}

impl SyncEngine {
    pub fn new(store: StoreHandle, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            remote,
            status: StatusIndicator::default(),
            log: OperationLog::new(),
            retry: RetryPolicy::default(),
            roster: None,
            syncing: AtomicBool::new(false),
            unsaved: AtomicBool::new(false),
        }
    }

    pub fn from_config(store: StoreHandle, remote: Arc<dyn RemoteStore>, config: &AppConfig) -> Self {
        Self::new(store, remote)
            .with_status(StatusIndicator::from_config(&config.status))
            .with_retry(RetryPolicy::from_config(&config.sync))
            .with_roster(config.team.assignees.clone())
    }

    pub fn with_status(mut self, status: StatusIndicator) -> Self {
        self.status = status;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Restrict assignees to `roster`
    pub fn with_roster(mut self, roster: Vec<String>) -> Self {
        self.roster = Some(roster);
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn status(&self) -> &StatusIndicator {
        &self.status
    }

    pub fn operations(&self) -> &OperationLog {
        &self.log
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::Acquire)
    }

    fn mark_unsaved(&self) {
        self.unsaved.store(true, Ordering::Release);
    }

    fn create_contract(&self) -> CreateChantierContract {
        match &self.roster {
            Some(roster) => CreateChantierContract::with_roster(roster),
            None => CreateChantierContract::new(),
        }
    }

    fn update_contract(&self) -> UpdateChantierContract {
        match &self.roster {
            Some(roster) => UpdateChantierContract::with_roster(roster),
            None => UpdateChantierContract::new(),
        }
    }

    /// Load the collection from the remote store, falling back to the cache
    #[instrument(skip(self), fields(remote = self.remote.name()))]
    pub async fn initial_load(&self) -> LoadSource {
        self.status.in_progress("Loading data from cloud...");
        match self.remote.fetch_all().await {
            Ok(jobs) => {
                let count = jobs.len();
                self.store.write().load(jobs);
                info!(count, "Collection loaded from remote store");
                self.status.success("Data loaded.");
                LoadSource::Remote(count)
            }
            Err(err) => {
                warn!(error = %err, "Remote load failed, using local cache");
                let count = self.store.write().load_from_cache();
                self.status.error(format!("Error loading data: {}", err));
                LoadSource::Cache(count)
            }
        }
    }

    /// Create a record.
    ///
    /// The draft is validated, inserted locally under a placeholder id and
    /// sent to the remote store; on success the placeholder is replaced by
    /// the server's record. On a remote failure the placeholder record stays
    /// and the error is returned.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, mut draft: Chantier) -> PlanResult<Chantier> {
        draft.normalize();
        if let Err(errors) = self.create_contract().validate(&draft) {
            warn!(errors = %errors, "Chantier rejected before saving");
            return Err(errors.into());
        }

        self.status.in_progress("Saving chantier...");
        let local_id = {
            let mut store = self.store.write();
            let local_id = store.next_local_id();
            let mut local = draft.clone();
            local.id = Some(local_id.clone());
            local.touch();
            store.upsert(local);
            local_id
        };
        self.log.begin(&local_id, OperationKind::Create);

        let result = self.remote.create(&draft).await.and_then(|created| {
            match created.id.clone() {
                Some(id) => Ok((id, created)),
                None => Err(RemoteError::Decode("created record has no id".to_string())),
            }
        });

        match result {
            Ok((id, created)) => {
                {
                    let mut store = self.store.write();
                    store.replace_id(&local_id, &id);
                    store.upsert(created.clone());
                }
                self.log
                    .record(&local_id, OperationKind::Create, OperationState::Confirmed);
                self.log.rekey(&local_id, &id);
                self.status.success("Chantier saved successfully!");
                Ok(created)
            }
            Err(err) => {
                self.log.record(
                    &local_id,
                    OperationKind::Create,
                    OperationState::Failed(err.to_string()),
                );
                self.mark_unsaved();
                self.status.error(format!("Error saving chantier: {}", err));
                Err(err.into())
            }
        }
    }

    /// Create a record without contacting the remote store.
    ///
    /// The draft goes through the same validation as [`create`](Self::create)
    /// and is kept under a placeholder id until the next sweep pushes it.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create_local(&self, mut draft: Chantier) -> PlanResult<Chantier> {
        draft.normalize();
        if let Err(errors) = self.create_contract().validate(&draft) {
            warn!(errors = %errors, "Chantier rejected before saving");
            return Err(errors.into());
        }

        let local = {
            let mut store = self.store.write();
            draft.id = Some(store.next_local_id());
            draft.touch();
            store.upsert(draft.clone());
            draft
        };
        if let Some(id) = local.id.as_deref() {
            self.log.begin(id, OperationKind::Create);
        }
        self.mark_unsaved();
        debug!(id = ?local.id, "Chantier kept locally");
        Ok(local)
    }

    /// Replace the record `id` with `job`.
    ///
    /// Returns the record as it now stands, or `None` when the server no
    /// longer knew it and it was removed locally.
    #[instrument(skip(self, job))]
    pub async fn update(&self, id: &str, mut job: Chantier) -> PlanResult<Option<Chantier>> {
        job.id = Some(id.to_string());
        job.normalize();
        if let Err(errors) = self.update_contract().validate(&job) {
            warn!(errors = %errors, "Chantier update rejected");
            return Err(errors.into());
        }

        job.touch();
        self.store.write().upsert(job.clone());

        if is_local_id(id) {
            debug!("Record not yet created remotely, kept for the next sweep");
            self.mark_unsaved();
            return Ok(Some(job));
        }

        self.status.in_progress("Updating chantier...");
        self.log.begin(id, OperationKind::Update);
        let result = self.remote.update(id, &job).await.map_err(PlanError::from);
        self.finish_update(id, OperationKind::Update, job, result)
    }

    /// Move a job to the dropped day and send its new dates
    #[instrument(skip(self, drag_drop), fields(job_id = %drag_drop.job_id, day = %drag_drop.day))]
    pub async fn reschedule(&self, drag_drop: &DragDrop) -> PlanResult<Option<Chantier>> {
        let moved = {
            let store = self.store.read();
            drag_drop.apply(store.jobs())
        };
        let Some(moved) = moved else {
            debug!("Dropped job is not in the collection, ignored");
            return Ok(None);
        };
        self.store.write().upsert(moved.clone());

        let id = drag_drop.job_id.as_str();
        if is_local_id(id) {
            self.mark_unsaved();
            return Ok(Some(moved));
        }

        self.status.in_progress("Updating chantier...");
        self.log.begin(id, OperationKind::Reschedule);
        let result = self
            .remote
            .update_dates(id, &moved.start_date, &moved.end_date)
            .await
            .map_err(PlanError::from);
        self.finish_update(id, OperationKind::Reschedule, moved, result)
    }

    fn finish_update(
        &self,
        id: &str,
        kind: OperationKind,
        local: Chantier,
        result: PlanResult<Option<Chantier>>,
    ) -> PlanResult<Option<Chantier>> {
        match result.allow_not_found() {
            Ok(Some(canonical)) => {
                let current = match canonical {
                    Some(record) => {
                        self.store.write().upsert(record.clone());
                        record
                    }
                    None => local,
                };
                self.log.record(id, kind, OperationState::Confirmed);
                self.status.success("Chantier updated successfully!");
                Ok(Some(current))
            }
            Ok(None) => {
                self.store.write().remove(id);
                self.log.record(id, kind, OperationState::NotFound);
                self.log.retire(id);
                self.status.warning(NOT_FOUND_REMOVED);
                Ok(None)
            }
            Err(err) => {
                self.log
                    .record(id, kind, OperationState::Failed(err.to_string()));
                self.mark_unsaved();
                self.status.error(format!("Error updating chantier: {}", err));
                Err(err)
            }
        }
    }

    /// Delete a record. A record the server no longer knows is removed
    /// locally as well; other failures keep it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> PlanResult<()> {
        if is_local_id(id) {
            self.store.write().remove(id);
            self.log.forget(id);
            self.status.success("Chantier deleted successfully from server");
            return Ok(());
        }

        self.status.in_progress("Deleting chantier...");
        self.log.begin(id, OperationKind::Delete);
        let result = self.remote.delete(id).await.map_err(PlanError::from);

        match result.allow_not_found() {
            Ok(Some(())) => {
                self.store.write().remove(id);
                self.log.record(id, OperationKind::Delete, OperationState::Confirmed);
                self.log.retire(id);
                self.status.success("Chantier deleted successfully from server");
                Ok(())
            }
            Ok(None) => {
                self.store.write().remove(id);
                self.log.record(id, OperationKind::Delete, OperationState::NotFound);
                self.log.retire(id);
                self.status.warning(NOT_FOUND_REMOVED);
                Ok(())
            }
            Err(err) => {
                self.log.record(
                    id,
                    OperationKind::Delete,
                    OperationState::Failed(err.to_string()),
                );
                self.status.error(format!("Error deleting: {}", err));
                Err(err)
            }
        }
    }

    /// Push the local collection to the remote store.
    ///
    /// Local records with a remote counterpart are updated, the others are
    /// created and adopt the server id, and remote records absent locally
    /// are deleted. Returns [`SweepOutcome::Skipped`] if a sweep is already
    /// running.
    ///
    /// The local collection is the store's in-memory snapshot, which the
    /// store writes through to the cache. Callers starting from a fresh
    /// process must call [`ChantierStore::load_from_cache`] first, or the
    /// sweep will treat every remote record as deleted.
    ///
    /// [`ChantierStore::load_from_cache`]: cp_store::ChantierStore::load_from_cache
    #[instrument(skip(self), fields(remote = self.remote.name()))]
    pub async fn sync_with_backend(&self) -> SweepOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            debug!("Sweep already running, skipped");
            return SweepOutcome::Skipped;
        };

        self.status.in_progress("Synchronisation en cours...");
        let remote_jobs = match self.fetch_with_retry().await {
            Ok(jobs) => jobs,
            Err(attempts) => {
                self.status
                    .error("Erreur de synchronisation. Mode hors ligne activé.");
                return SweepOutcome::Offline { attempts };
            }
        };

        let desired = self.store.read().snapshot();
        let remote_ids: HashSet<ChantierId> =
            remote_jobs.iter().filter_map(|j| j.id.clone()).collect();
        let mut report = SweepReport::default();

        for job in &desired {
            report.attempted += 1;
            let known_id = job.id.as_deref().filter(|id| remote_ids.contains(*id));
            let synced = match known_id {
                Some(id) => self.sweep_update(id, job).await,
                None => self.sweep_create(job).await,
            };
            if synced {
                report.succeeded += 1;
            }
        }

        let desired_ids: HashSet<&str> = desired.iter().filter_map(|j| j.id.as_deref()).collect();
        for id in remote_ids.iter().filter(|id| !desired_ids.contains(id.as_str())) {
            report.attempted += 1;
            if self.sweep_delete(id).await {
                report.succeeded += 1;
            }
        }

        info!(
            succeeded = report.succeeded,
            attempted = report.attempted,
            "Sweep finished"
        );

        if report.succeeded == report.attempted {
            self.unsaved.store(false, Ordering::Release);
            self.status.success("Synchronisé avec succès");
            SweepOutcome::Full(report)
        } else {
            let message = format!(
                "Synchronisé partiellement ({}/{})",
                report.succeeded, report.attempted
            );
            if report.succeeded > 0 {
                self.status.warning(message);
                SweepOutcome::Partial(report)
            } else {
                self.status.error(message);
                SweepOutcome::Failed(report)
            }
        }
    }

    /// Returns the collection, or the number of attempts made
    async fn fetch_with_retry(&self) -> Result<Vec<Chantier>, u32> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.remote.fetch_all().await {
                Ok(jobs) => return Ok(jobs),
                Err(err) => {
                    warn!(attempt, error = %err, "Fetching remote collection failed");
                    if attempt > self.retry.max_retries {
                        return Err(attempt);
                    }
                    self.status.in_progress(format!(
                        "Tentative de reconnexion ({}/{})...",
                        attempt, self.retry.max_retries
                    ));
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }

    async fn sweep_update(&self, id: &str, job: &Chantier) -> bool {
        self.log.begin(id, OperationKind::Update);
        match self.remote.update(id, job).await {
            Ok(_) => {
                self.log.record(id, OperationKind::Update, OperationState::Confirmed);
                true
            }
            Err(err) => {
                let state = if err.is_not_found() {
                    OperationState::NotFound
                } else {
                    OperationState::Failed(err.to_string())
                };
                warn!(id, error = %err, "Sweep update failed");
                self.log.record(id, OperationKind::Update, state);
                false
            }
        }
    }

    async fn sweep_create(&self, job: &Chantier) -> bool {
        let old_id = job.id.clone();
        let pending = job.without_id();

        match self.remote.create(&pending).await {
            Ok(created) => {
                let Some(new_id) = created.id.clone() else {
                    warn!(title = %job.title, "Created record has no id");
                    return false;
                };
                {
                    let mut store = self.store.write();
                    let adopted = match &old_id {
                        Some(old) => store.replace_id(old, &new_id),
                        None => store.adopt_pending(&pending, &new_id),
                    };
                    if adopted {
                        store.upsert(created);
                    }
                }
                if let Some(old) = &old_id {
                    self.log.rekey(old, &new_id);
                }
                self.log
                    .record(&new_id, OperationKind::Create, OperationState::Confirmed);
                true
            }
            Err(err) => {
                warn!(title = %job.title, error = %err, "Sweep create failed");
                if let Some(old) = &old_id {
                    self.log.record(
                        old,
                        OperationKind::Create,
                        OperationState::Failed(err.to_string()),
                    );
                }
                false
            }
        }
    }

    async fn sweep_delete(&self, id: &str) -> bool {
        self.log.begin(id, OperationKind::Delete);
        match self.remote.delete(id).await {
            Ok(()) => {
                self.log.record(id, OperationKind::Delete, OperationState::Confirmed);
                self.log.retire(id);
                true
            }
            Err(err) if err.is_not_found() => {
                self.log.record(id, OperationKind::Delete, OperationState::NotFound);
                self.log.retire(id);
                true
            }
            Err(err) => {
                warn!(id, error = %err, "Sweep delete failed");
                self.log.record(
                    id,
                    OperationKind::Delete,
                    OperationState::Failed(err.to_string()),
                );
                false
            }
        }
    }

    /// Save every record with a document-store id concurrently.
    ///
    /// Records the server no longer knows are created again and adopt the
    /// new id. Waits for the whole batch.
    #[instrument(skip(self), fields(remote = self.remote.name()))]
    pub async fn save_all(&self) -> SaveAllReport {
        self.status.in_progress("Saving to backend...");
        let jobs = self.store.read().snapshot();

        let (eligible, skipped): (Vec<Chantier>, Vec<Chantier>) =
            jobs.into_iter().partition(Chantier::has_object_id);
        for job in &skipped {
            warn!(id = ?job.id, title = %job.title, "Skipping chantier without a valid id");
        }

        let results = join_all(eligible.iter().map(|job| self.save_one(job))).await;

        let mut report = SaveAllReport {
            skipped: skipped.len(),
            ..Default::default()
        };
        for (job, result) in eligible.iter().zip(results) {
            match result {
                SaveResult::Saved => report.saved += 1,
                SaveResult::Recreated => report.recreated += 1,
                SaveResult::Failed(message) => {
                    report.failures.push((job.id.clone().unwrap_or_default(), message))
                }
            }
        }

        match report.failures.first() {
            None => {
                if report.skipped == 0 {
                    self.unsaved.store(false, Ordering::Release);
                }
                self.status.success("All chantiers saved successfully");
            }
            Some((_, message)) => {
                self.mark_unsaved();
                self.status.error(format!("Error: {}", message));
            }
        }
        report
    }

    async fn save_one(&self, job: &Chantier) -> SaveResult {
        let Some(id) = job.id.as_deref() else {
            return SaveResult::Failed("record has no id".to_string());
        };
        self.log.begin(id, OperationKind::Save);

        match self.remote.update(id, job).await {
            Ok(canonical) => {
                if let Some(record) = canonical {
                    self.store.write().upsert(record);
                }
                self.log.record(id, OperationKind::Save, OperationState::Confirmed);
                SaveResult::Saved
            }
            Err(err) if err.is_not_found() => {
                warn!(id, "Chantier not found in database, creating it again");
                self.log.record(id, OperationKind::Save, OperationState::NotFound);
                self.recreate(id, job).await
            }
            Err(err) => {
                let message = format!("Failed to save chantier {}: {}", id, err);
                self.log
                    .record(id, OperationKind::Save, OperationState::Failed(message.clone()));
                SaveResult::Failed(message)
            }
        }
    }

    async fn recreate(&self, old_id: &str, job: &Chantier) -> SaveResult {
        match self.remote.create(&job.without_id()).await {
            Ok(created) => {
                let Some(new_id) = created.id.clone() else {
                    return SaveResult::Failed(format!(
                        "Failed to create chantier: no id returned for {}",
                        old_id
                    ));
                };
                {
                    let mut store = self.store.write();
                    if store.replace_id(old_id, &new_id) {
                        store.upsert(created);
                    }
                }
                self.log.rekey(old_id, &new_id);
                self.log
                    .record(&new_id, OperationKind::Create, OperationState::Confirmed);
                info!(old_id, new_id = %new_id, "Recreated chantier with new id");
                SaveResult::Recreated
            }
            Err(err) => {
                let message = format!("Failed to create chantier: {}", err);
                self.log.record(
                    old_id,
                    OperationKind::Create,
                    OperationState::Failed(message.clone()),
                );
                SaveResult::Failed(message)
            }
        }
    }

    /// Sweep once if local changes have not reached the server
    pub async fn flush_on_exit(&self) -> Option<SweepOutcome> {
        if !self.has_unsaved_changes() {
            return None;
        }
        info!("Unsaved changes, syncing before exit");
        Some(self.sync_with_backend().await)
    }
}
