//! Chantier model

use chrono::{DateTime, NaiveDate, Utc};
use cp_core::dates::{is_within, DateRange, DateValue};
use cp_core::traits::{ChantierId, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::attachments::{self, ImageAttachment, PdfAttachment};
use super::wire;
use crate::status::Status;
use crate::urgency::Urgency;

/// Chantier (job) entity
///
/// `id` is `None` until the remote store has confirmed the record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Chantier {
    #[serde(
        default,
        deserialize_with = "wire::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ChantierId>,

    #[validate(length(max = 255))]
    #[serde(default, deserialize_with = "wire::text")]
    pub title: String,

    #[serde(default, deserialize_with = "wire::text")]
    pub description: String,

    #[serde(default)]
    pub start_date: DateValue,

    #[serde(default)]
    pub end_date: DateValue,

    #[serde(default)]
    pub status: Status,

    /// Estimated duration in days
    #[serde(
        default,
        deserialize_with = "wire::estimated_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_duration: Option<u32>,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(
        default,
        deserialize_with = "wire::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,

    #[serde(
        default,
        deserialize_with = "wire::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_phone: Option<String>,

    #[validate(email)]
    #[serde(
        default,
        deserialize_with = "wire::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_email: Option<String>,

    #[serde(default, deserialize_with = "wire::assignees")]
    pub assignees: Vec<String>,

    /// Free-form quote notes
    #[serde(default, deserialize_with = "wire::text")]
    pub devis: String,

    #[serde(
        default,
        deserialize_with = "attachments::deserialize_images",
        serialize_with = "attachments::serialize_as_json_string"
    )]
    pub images: Vec<ImageAttachment>,

    #[serde(
        default,
        deserialize_with = "attachments::deserialize_pdfs",
        serialize_with = "attachments::serialize_as_json_string"
    )]
    pub pdfs: Vec<PdfAttachment>,

    #[serde(
        default,
        deserialize_with = "wire::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_chantier_id: Option<ChantierId>,

    #[serde(
        default,
        deserialize_with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chantier {
    pub fn new(
        title: impl Into<String>,
        start_date: impl Into<DateValue>,
        end_date: impl Into<DateValue>,
    ) -> Self {
        Self {
            title: title.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<ChantierId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<ChantierId>) -> Self {
        self.parent_chantier_id = Some(parent_id.into());
        self.normalize();
        self
    }

    pub fn with_assignees<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = names.into_iter().map(Into::into).collect();
        self.normalize();
        self
    }

    /// Re-apply ingestion rules after in-process edits
    pub fn normalize(&mut self) {
        self.assignees = wire::dedup_names(std::mem::take(&mut self.assignees));
        if self
            .parent_chantier_id
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            self.parent_chantier_id = None;
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start_date.clone(),
            end: self.end_date.clone(),
        }
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.start_date = range.start;
        self.end_date = range.end;
    }

    pub fn duration_days(&self) -> i64 {
        self.date_range().duration_days()
    }

    /// Inclusive: the job occupies both its start and end day
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        is_within(day, &self.start_date, &self.end_date)
    }

    /// Ended before `today`; an unreadable end date counts as past
    pub fn is_past(&self, today: NaiveDate) -> bool {
        match self.end_date.as_date() {
            Some(end) => end < today,
            None => true,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_chantier_id.as_deref()
    }

    pub fn is_child(&self) -> bool {
        self.parent_chantier_id.is_some()
    }

    /// Id as assigned by the document store (24 hex characters)
    pub fn has_object_id(&self) -> bool {
        self.id.as_deref().is_some_and(is_object_id)
    }

    /// First photo, used as the list thumbnail
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(|img| img.data.as_str())
    }

    /// Re-stamp the local modification time
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Copy without id, as sent when (re-)creating the record remotely
    pub fn without_id(&self) -> Chantier {
        Chantier {
            id: None,
            ..self.clone()
        }
    }
}

/// Whether `id` looks like a document-store object id
pub fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Identifiable for Chantier {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Timestamped for Chantier {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_chantier() {
        let job = Chantier::new("Roof repair", "2024-03-01", "2024-03-03");
        assert!(job.is_new_record());
        assert_eq!(job.duration_days(), 2);
        assert_eq!(job.urgency, Urgency::Normal);
        assert_eq!(job.status, Status::Ongoing);
        assert!(job.occurs_on(d("2024-03-03")));
        assert!(!job.occurs_on(d("2024-03-04")));
    }

    #[test]
    fn test_ingests_loose_record() {
        let job: Chantier = serde_json::from_value(json!({
            "id": "65f1c2a9e4b0a1b2c3d4e5f6",
            "title": "Kitchen",
            "description": null,
            "startDate": "2024-03-01T00:00:00.000Z",
            "endDate": "soon",
            "status": "completed",
            "estimatedDuration": "4",
            "urgency": "medium",
            "address": "  ",
            "assignees": ["wang", "he", "wang"],
            "images": "[{\"data\":\"data:image/png;base64,AAA\"}]",
            "pdfs": [],
            "parentChantierId": "",
            "createdAt": "2024-02-20T10:00:00Z"
        }))
        .unwrap();

        assert!(job.has_object_id());
        assert_eq!(job.description, "");
        assert_eq!(job.start_date, DateValue::Valid(d("2024-03-01")));
        assert_eq!(job.end_date, DateValue::Invalid("soon".into()));
        assert_eq!(job.status, Status::Completed);
        assert_eq!(job.estimated_duration, Some(4));
        assert_eq!(job.urgency, Urgency::Normal);
        assert_eq!(job.address, None);
        assert_eq!(job.assignees, vec!["wang", "he"]);
        assert_eq!(job.thumbnail(), Some("data:image/png;base64,AAA"));
        assert_eq!(job.parent_chantier_id, None);
        assert!(job.created_at.is_some());
        assert!(job.is_past(d("2020-01-01")));
    }

    #[test]
    fn test_wire_encoding() {
        let mut job = Chantier::new("Facade", "2024-04-01", "2024-04-02")
            .with_parent("65f1c2a9e4b0a1b2c3d4e5f6");
        job.images.push(ImageAttachment::new("data:image/png;base64,AAA"));
        job.urgency = Urgency::Urgent;

        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["startDate"], json!("2024-04-01"));
        assert_eq!(value["urgency"], json!("4"));
        assert_eq!(value["parentChantierId"], json!("65f1c2a9e4b0a1b2c3d4e5f6"));
        assert_eq!(
            value["images"],
            json!("[{\"data\":\"data:image/png;base64,AAA\",\"comment\":\"\"}]")
        );
        assert_eq!(value["pdfs"], json!("[]"));

        let back: Chantier = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_normalize_and_object_ids() {
        let job = Chantier::new("a", "2024-01-01", "2024-01-01")
            .with_parent(" ")
            .with_assignees(["hu", "hu", " guo "]);
        assert_eq!(job.parent_chantier_id, None);
        assert_eq!(job.assignees, vec!["hu", "guo"]);

        assert!(is_object_id("65f1c2a9e4b0a1b2c3d4e5f6"));
        assert!(!is_object_id("local-1"));
        assert!(!is_object_id("65f1c2a9e4b0a1b2c3d4e5fz"));
    }

    #[test]
    fn test_email_validation() {
        let mut job = Chantier::new("a", "2024-01-01", "2024-01-01");
        job.contact_email = Some("not-an-email".into());
        assert!(job.validate().is_err());
        job.contact_email = Some("chef@chantier.fr".into());
        assert!(job.validate().is_ok());
    }
}
