//! In-memory remote store
//!
//! Behaves like the REST service (24-hex ids, 400 on missing required
//! fields, 404 on unknown ids) and lets tests inject failures and latency.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cp_core::dates::DateValue;
use cp_models::Chantier;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::remote::RemoteStore;

const MISSING_FIELDS: &str = "Missing required fields (title, startDate, endDate)";

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Chantier>,
    next_id: u64,
    offline: bool,
    failing_fetches: u32,
    failing_titles: HashSet<String>,
    failing_updates: HashSet<String>,
    failing_deletes: HashSet<String>,
    calls: Vec<String>,
}

impl Inner {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline {
            Err(RemoteError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store; records without an id get one
    pub fn with_records(records: impl IntoIterator<Item = Chantier>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for mut record in records {
                if record.id.is_none() {
                    record.id = Some(inner.assign_id());
                }
                inner.records.push(record);
            }
        }
        store
    }

    /// Delay every call, so tests can overlap operations
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// The next `count` fetches fail with a network error
    pub fn fail_next_fetches(&self, count: u32) {
        self.inner.lock().failing_fetches = count;
    }

    /// Creates of records with this title answer 500
    pub fn fail_creates_titled(&self, title: impl Into<String>) {
        self.inner.lock().failing_titles.insert(title.into());
    }

    pub fn fail_updates_for(&self, id: impl Into<String>) {
        self.inner.lock().failing_updates.insert(id.into());
    }

    pub fn fail_deletes_for(&self, id: impl Into<String>) {
        self.inner.lock().failing_deletes.insert(id.into());
    }

    pub fn records(&self) -> Vec<Chantier> {
        self.inner.lock().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<Chantier> {
        let inner = self.inner.lock();
        inner.position(id).map(|i| inner.records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Calls received so far, e.g. `GET`, `POST Roof repair`, `PUT <id>`
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn server_error(message: &str) -> RemoteError {
    RemoteError::Status {
        status: 500,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_all(&self) -> RemoteResult<Vec<Chantier>> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock();
        inner.calls.push("GET".to_string());
        inner.check_online()?;
        if inner.failing_fetches > 0 {
            inner.failing_fetches -= 1;
            return Err(RemoteError::Network("connection reset".to_string()));
        }
        Ok(inner.records.clone())
    }

    async fn create(&self, job: &Chantier) -> RemoteResult<Chantier> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock();
        inner.calls.push(format!("POST {}", job.title));
        inner.check_online()?;

        if job.title.trim().is_empty() || job.start_date.is_missing() || job.end_date.is_missing() {
            return Err(RemoteError::Status {
                status: 400,
                message: Some(MISSING_FIELDS.to_string()),
            });
        }
        if inner.failing_titles.contains(&job.title) {
            return Err(server_error("Failed to create chantier"));
        }

        let now = Utc::now();
        let mut created = job.without_id();
        created.id = Some(inner.assign_id());
        created.created_at = Some(now);
        created.updated_at = Some(now);
        inner.records.push(created.clone());

        debug!(id = ?created.id, "Record created in memory");
        Ok(created)
    }

    async fn update(&self, id: &str, job: &Chantier) -> RemoteResult<Option<Chantier>> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock();
        inner.calls.push(format!("PUT {}", id));
        inner.check_online()?;

        let position = inner
            .position(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if inner.failing_updates.contains(id) {
            return Err(server_error("Failed to update chantier"));
        }

        let created_at = inner.records[position].created_at;
        let mut updated = job.without_id();
        updated.id = Some(id.to_string());
        updated.created_at = created_at;
        updated.updated_at = Some(Utc::now());
        inner.records[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn update_dates(
        &self,
        id: &str,
        start_date: &DateValue,
        end_date: &DateValue,
    ) -> RemoteResult<Option<Chantier>> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock();
        inner.calls.push(format!("PUT {}", id));
        inner.check_online()?;

        let position = inner
            .position(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if inner.failing_updates.contains(id) {
            return Err(server_error("Failed to update chantier"));
        }

        let record = &mut inner.records[position];
        record.start_date = start_date.clone();
        record.end_date = end_date.clone();
        record.updated_at = Some(Utc::now());
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock();
        inner.calls.push(format!("DELETE {}", id));
        inner.check_online()?;

        let position = inner
            .position(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if inner.failing_deletes.contains(id) {
            return Err(server_error("Failed to delete chantier"));
        }
        inner.records.remove(position);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_object_ids() {
        let remote = InMemoryRemoteStore::new();
        let created = remote
            .create(&Chantier::new("Roof repair", "2024-03-01", "2024-03-03"))
            .await
            .unwrap();

        assert!(created.has_object_id());
        assert!(created.created_at.is_some());
        assert_eq!(remote.fetch_all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let remote = InMemoryRemoteStore::new();
        let err = remote
            .create(&Chantier::new("Roof repair", DateValue::missing(), "2024-03-03"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 400, .. }));
        assert!(remote.is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let remote =
            InMemoryRemoteStore::with_records([Chantier::new("Kitchen", "2024-05-01", "2024-05-02")]);
        let id = remote.records()[0].id.clone().unwrap();

        remote.fail_next_fetches(1);
        assert!(remote.fetch_all().await.is_err());
        assert_eq!(remote.fetch_all().await.unwrap().len(), 1);

        remote.fail_deletes_for(id.clone());
        assert!(matches!(
            remote.delete(&id).await,
            Err(RemoteError::Status { status: 500, .. })
        ));
        assert!(remote.delete("000000000000000000000000").await.unwrap_err().is_not_found());

        remote.set_offline(true);
        assert!(matches!(remote.fetch_all().await, Err(RemoteError::Network(_))));
        assert_eq!(remote.count_calls("GET"), 3);
    }
}
