//! The job store
//!
//! Owns the session's collection of chantiers. Ids are unique within the
//! collection; jobs without an id are pending creation and are always
//! appended. Records created offline get a `local-` placeholder id until
//! the remote store assigns the real one through [`ChantierStore::replace_id`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use cp_core::dates::start_of_today;
use cp_core::traits::ChantierId;
use cp_models::Chantier;
use cp_queries::ChantierFilter;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheError, LocalCache, MemoryCache};

/// Cache key of the job snapshot
pub const JOBS_KEY: &str = "jobs";

/// Prefix of placeholder ids given to records not yet known remotely
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Shared handle to the store
pub type StoreHandle = Arc<RwLock<ChantierStore>>;

pub struct ChantierStore {
    jobs: Vec<Chantier>,
    cache: Arc<dyn LocalCache>,
    local_seq: AtomicU64,
}

impl std::fmt::Debug for ChantierStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChantierStore")
            .field("jobs", &self.jobs.len())
            .field("cache", &self.cache.name())
            .finish()
    }
}

impl ChantierStore {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self {
            jobs: Vec::new(),
            cache,
            local_seq: AtomicU64::new(0),
        }
    }

    /// Store backed by a [`MemoryCache`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub fn into_handle(self) -> StoreHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn cache(&self) -> Arc<dyn LocalCache> {
        Arc::clone(&self.cache)
    }

    /// Replace the entire collection
    pub fn load(&mut self, jobs: Vec<Chantier>) {
        self.jobs = Vec::with_capacity(jobs.len());
        for job in jobs {
            self.insert_or_replace(job);
        }
        debug!(count = self.jobs.len(), "Collection loaded");
        self.persist();
    }

    /// Insert if the id is new, replace otherwise.
    ///
    /// Returns `true` when the job was inserted.
    pub fn upsert(&mut self, job: Chantier) -> bool {
        let inserted = self.insert_or_replace(job);
        self.persist();
        inserted
    }

    /// Delete by id; absent ids are a no-op
    pub fn remove(&mut self, id: &str) -> Option<Chantier> {
        let position = self.position(id)?;
        let removed = self.jobs.remove(position);
        self.persist();
        Some(removed)
    }

    pub fn find(&self, id: &str) -> Option<&Chantier> {
        self.position(id).map(|i| &self.jobs[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Filter relative to the local calendar day
    pub fn filter(&self, filter: &ChantierFilter) -> Vec<Chantier> {
        self.filter_at(filter, start_of_today())
    }

    pub fn filter_at(&self, filter: &ChantierFilter, today: NaiveDate) -> Vec<Chantier> {
        filter.apply(&self.jobs, today)
    }

    /// Adopt a server-assigned id.
    ///
    /// When `new_id` is already present the older entry is dropped so ids
    /// stay unique. Returns `false` when `old_id` is unknown.
    pub fn replace_id(&mut self, old_id: &str, new_id: &str) -> bool {
        let Some(position) = self.position(old_id) else {
            return false;
        };
        if old_id != new_id {
            if let Some(duplicate) = self.position(new_id) {
                self.jobs.remove(duplicate);
            }
        }
        if let Some(job) = self
            .jobs
            .iter_mut()
            .find(|j| j.id.as_deref() == Some(old_id))
        {
            job.id = Some(new_id.to_string());
        }
        debug!(old_id, new_id, position, "Adopted remote id");
        self.persist();
        true
    }

    /// Give an id to the first id-less job equal to `pending`
    pub fn adopt_pending(&mut self, pending: &Chantier, new_id: &str) -> bool {
        let Some(job) = self
            .jobs
            .iter_mut()
            .find(|j| j.id.is_none() && j.without_id() == *pending)
        else {
            return false;
        };
        job.id = Some(new_id.to_string());
        self.persist();
        true
    }

    /// Placeholder id for a record created locally
    pub fn next_local_id(&self) -> ChantierId {
        let seq = self.local_seq.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{}-{}",
            LOCAL_ID_PREFIX,
            Utc::now().timestamp_millis(),
            seq
        )
    }

    pub fn jobs(&self) -> &[Chantier] {
        &self.jobs
    }

    pub fn snapshot(&self) -> Vec<Chantier> {
        self.jobs.clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Replace the collection with the cached snapshot, without writing back.
    ///
    /// A missing or unreadable snapshot yields an empty collection.
    pub fn load_from_cache(&mut self) -> usize {
        let jobs = self.read_cache();
        self.jobs = Vec::with_capacity(jobs.len());
        for job in jobs {
            self.insert_or_replace(job);
        }
        debug!(count = self.jobs.len(), cache = self.cache.name(), "Collection loaded from cache");
        self.jobs.len()
    }

    /// The cached snapshot; empty when missing or unreadable
    pub fn read_cache(&self) -> Vec<Chantier> {
        match self.try_read_cache() {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(error = %err, cache = self.cache.name(), "Failed to read job cache");
                Vec::new()
            }
        }
    }

    fn try_read_cache(&self) -> Result<Vec<Chantier>, CacheError> {
        let Some(raw) = self.cache.get(JOBS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
            key: JOBS_KEY.to_string(),
            source,
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.jobs.iter().position(|j| j.id.as_deref() == Some(id))
    }

    fn insert_or_replace(&mut self, job: Chantier) -> bool {
        let existing = job.id.as_deref().and_then(|id| self.position(id));
        match existing {
            Some(position) => {
                self.jobs[position] = job;
                false
            }
            None => {
                self.jobs.push(job);
                true
            }
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.jobs)
            .map_err(|source| CacheError::Corrupt {
                key: JOBS_KEY.to_string(),
                source,
            })
            .and_then(|json| self.cache.put(JOBS_KEY, &json));

        match result {
            Ok(()) => debug!(count = self.jobs.len(), cache = self.cache.name(), "Job cache written"),
            Err(err) => warn!(error = %err, cache = self.cache.name(), "Failed to write job cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheResult, FileCache};
    use cp_models::Status;

    struct FailingCache;

    impl LocalCache for FailingCache {
        fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
        fn put(&self, _key: &str, _value: &str) -> CacheResult<()> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Unavailable("quota exceeded".into()))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn job(id: &str, title: &str) -> Chantier {
        Chantier::new(title, "2024-03-01", "2024-03-03").with_id(id)
    }

    #[test]
    fn test_upsert_inserts_then_replaces() {
        let mut store = ChantierStore::in_memory();
        assert!(store.upsert(job("a", "Roof")));
        assert!(!store.upsert(job("a", "Roof repair")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("a").map(|j| j.title.as_str()), Some("Roof repair"));
    }

    #[test]
    fn test_jobs_without_id_are_appended() {
        let mut store = ChantierStore::in_memory();
        store.upsert(Chantier::new("draft", "2024-03-01", "2024-03-01"));
        store.upsert(Chantier::new("draft", "2024-03-01", "2024-03-01"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = ChantierStore::in_memory();
        store.load(vec![job("a", "Roof"), job("b", "Kitchen")]);

        assert!(store.remove("a").is_some());
        let after_first: Vec<Chantier> = store.snapshot();
        assert!(store.remove("a").is_none());
        assert_eq!(store.snapshot(), after_first);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_deduplicates_ids() {
        let mut store = ChantierStore::in_memory();
        store.load(vec![job("a", "first"), job("a", "second")]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("a").map(|j| j.title.as_str()), Some("second"));
    }

    #[test]
    fn test_replace_id() {
        let mut store = ChantierStore::in_memory();
        let local_id = store.next_local_id();
        assert!(local_id.starts_with(LOCAL_ID_PREFIX));
        store.upsert(job(&local_id, "Roof"));

        assert!(store.replace_id(&local_id, "65f1c2a9e4b0a1b2c3d4e5f6"));
        assert!(store.find(&local_id).is_none());
        assert!(store.find("65f1c2a9e4b0a1b2c3d4e5f6").is_some());
        assert!(!store.replace_id("missing", "x"));
    }

    #[test]
    fn test_adopt_pending() {
        let mut store = ChantierStore::in_memory();
        let pending = Chantier::new("draft", "2024-03-01", "2024-03-01");
        store.upsert(pending.clone());

        assert!(store.adopt_pending(&pending, "65f1c2a9e4b0a1b2c3d4e5f6"));
        assert!(store.find("65f1c2a9e4b0a1b2c3d4e5f6").is_some());
        assert!(!store.adopt_pending(&pending, "65f1c2a9e4b0a1b2c3d4e5f7"));
    }

    #[test]
    fn test_local_ids_are_unique() {
        let store = ChantierStore::in_memory();
        assert_ne!(store.next_local_id(), store.next_local_id());
    }

    #[test]
    fn test_mutations_write_through_to_cache() {
        let cache = Arc::new(MemoryCache::new());
        let mut store = ChantierStore::new(cache.clone());
        store.upsert(job("a", "Roof"));
        store.upsert(job("b", "Kitchen"));
        store.remove("a");

        let mut restored = ChantierStore::new(cache);
        assert_eq!(restored.load_from_cache(), 1);
        assert!(restored.find("b").is_some());
    }

    #[test]
    fn test_cache_failures_are_swallowed() {
        let mut store = ChantierStore::new(Arc::new(FailingCache));
        store.upsert(job("a", "Roof"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_from_cache(), 0);
    }

    #[test]
    fn test_corrupt_cache_reads_as_empty() {
        let cache = Arc::new(MemoryCache::new());
        cache.put(JOBS_KEY, "{not json").unwrap();
        let store = ChantierStore::new(cache);
        assert!(store.read_cache().is_empty());
    }

    #[test]
    fn test_file_cache_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = ChantierStore::new(Arc::new(FileCache::new(dir.path())));
            let mut done = job("a", "Roof");
            done.status = Status::Completed;
            store.load(vec![done]);
        }
        let mut store = ChantierStore::new(Arc::new(FileCache::new(dir.path())));
        store.load_from_cache();
        assert_eq!(store.find("a").map(|j| j.status), Some(Status::Completed));
    }

    #[test]
    fn test_filter() {
        let mut store = ChantierStore::in_memory();
        let mut done = job("a", "Roof");
        done.status = Status::Completed;
        store.load(vec![done, job("b", "Kitchen")]);

        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let filtered = store.filter_at(&ChantierFilter::new().status(Status::Ongoing), today);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Kitchen");
    }
}
