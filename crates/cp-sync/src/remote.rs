//! The remote store seam

use async_trait::async_trait;
use cp_core::dates::DateValue;
use cp_models::Chantier;

use crate::error::RemoteResult;

/// Remote persistence of the chantier collection.
///
/// Update operations return the server's canonical record when it sends
/// one, `None` when it only acknowledged the write.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET /chantiers`
    async fn fetch_all(&self) -> RemoteResult<Vec<Chantier>>;

    /// `POST /chantiers`; `job` is sent without its id. Returns the created
    /// record carrying the server-assigned id.
    async fn create(&self, job: &Chantier) -> RemoteResult<Chantier>;

    /// `PUT /chantiers/{id}` with the full record
    async fn update(&self, id: &str, job: &Chantier) -> RemoteResult<Option<Chantier>>;

    /// `PUT /chantiers/{id}` with only the dates
    async fn update_dates(
        &self,
        id: &str,
        start_date: &DateValue,
        end_date: &DateValue,
    ) -> RemoteResult<Option<Chantier>>;

    /// `DELETE /chantiers/{id}`
    async fn delete(&self, id: &str) -> RemoteResult<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
