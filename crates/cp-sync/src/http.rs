//! REST client for the remote store
//!
//! Wraps `{base}/chantiers` using [`reqwest`]. Attachments are encoded by
//! the model's serializer, so request bodies are plain `Chantier` JSON.

use std::time::Duration;

use async_trait::async_trait;
use cp_core::config::AppConfig;
use cp_core::dates::DateValue;
use cp_models::Chantier;
use reqwest::header::CACHE_CONTROL;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::RemoteStore;

/// HTTP client for the chantier REST API
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// * `base_url` - API root, e.g. `http://127.0.0.1:5000/api`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &AppConfig) -> RemoteResult<Self> {
        Self::new(config.remote.base_url.clone(), config.request_timeout())
    }

    /// Reuse an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/chantiers", self.base_url)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/chantiers/{}", self.base_url, id)
    }

    // ---- private helpers ----

    /// Map non-success statuses to errors. A 404 on a record URL becomes
    /// [`RemoteError::NotFound`]; other failures carry the server's
    /// `error` message when the body has one.
    async fn ensure_success(
        response: reqwest::Response,
        id: Option<&str>,
    ) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(RemoteError::NotFound(id.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });

        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Body as JSON; an empty body reads as `null`
    async fn read_json(response: reqwest::Response) -> RemoteResult<Value> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// A full record in a response body, if the server sent one
fn canonical_record(body: Value) -> RemoteResult<Option<Chantier>> {
    if body.get("title").is_none() {
        return Ok(None);
    }
    serde_json::from_value(body)
        .map(Some)
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

fn id_of(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    #[instrument(skip(self), fields(remote = "http"))]
    async fn fetch_all(&self) -> RemoteResult<Vec<Chantier>> {
        let response = self
            .client
            .get(self.collection_url())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let body = Self::read_json(Self::ensure_success(response, None).await?).await?;

        let Value::Array(items) = body else {
            warn!("Collection response is not an array, treating as empty");
            return Ok(Vec::new());
        };

        let mut jobs = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<Chantier>(item) {
                Ok(job) => jobs.push(job),
                Err(err) => warn!(error = %err, "Skipping unreadable record"),
            }
        }
        debug!(count = jobs.len(), "Fetched chantiers");
        Ok(jobs)
    }

    #[instrument(skip(self, job), fields(remote = "http", title = %job.title))]
    async fn create(&self, job: &Chantier) -> RemoteResult<Chantier> {
        let payload = job.without_id();
        let response = self
            .client
            .post(self.collection_url())
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_json(Self::ensure_success(response, None).await?).await?;

        let id = id_of(&body)
            .ok_or_else(|| RemoteError::Decode("created record has no id".to_string()))?;
        let mut created = canonical_record(body)?.unwrap_or(payload);
        created.id = Some(id);

        debug!(id = ?created.id, "Chantier created");
        Ok(created)
    }

    #[instrument(skip(self, job), fields(remote = "http"))]
    async fn update(&self, id: &str, job: &Chantier) -> RemoteResult<Option<Chantier>> {
        let response = self
            .client
            .put(self.record_url(id))
            .json(&job.without_id())
            .send()
            .await?;
        let body = Self::read_json(Self::ensure_success(response, Some(id)).await?).await?;
        canonical_record(body)
    }

    #[instrument(skip(self, start_date, end_date), fields(remote = "http", start = %start_date, end = %end_date))]
    async fn update_dates(
        &self,
        id: &str,
        start_date: &DateValue,
        end_date: &DateValue,
    ) -> RemoteResult<Option<Chantier>> {
        let response = self
            .client
            .put(self.record_url(id))
            .json(&json!({ "startDate": start_date, "endDate": end_date }))
            .send()
            .await?;
        let body = Self::read_json(Self::ensure_success(response, Some(id)).await?).await?;
        canonical_record(body)
    }

    #[instrument(skip(self), fields(remote = "http"))]
    async fn delete(&self, id: &str) -> RemoteResult<()> {
        let response = self.client.delete(self.record_url(id)).send().await?;
        Self::ensure_success(response, Some(id)).await?;
        debug!(id, "Chantier deleted");
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
