//! Core error types for Chantier Planner
//!
//! One error kind per failure class of the planning board: transport,
//! HTTP status, missing record, validation, local cache and configuration.

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all planning operations
#[derive(Error, Debug)]
pub enum PlanError {
    /// The request never produced a response (refused, reset, timed out)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote store answered with a non-success status
    #[error("HTTP error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    /// The record is already absent on the remote store (404)
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Local durable cache read/write failure, never fatal
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlanError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PlanError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlanError::NotFound { .. })
    }

    /// Transport or server-side failures that may succeed when retried
    pub fn is_transient(&self) -> bool {
        match self {
            PlanError::Network(_) => true,
            PlanError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Validation errors collection
///
/// Field-specific messages are kept in a sorted map so that rendered
/// messages are stable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, the collection itself otherwise
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "can't be blank");
        errors.add("startDate", "can't be blank");
        errors.add_base("Chantier is invalid");

        assert!(errors.has_error("title"));
        assert!(!errors.has_error("endDate"));
        assert_eq!(
            errors.full_messages(),
            vec![
                "Chantier is invalid".to_string(),
                "startDate can't be blank".to_string(),
                "title can't be blank".to_string(),
            ]
        );
    }

    #[test]
    fn test_merge_and_into_result() {
        let mut a = ValidationErrors::new();
        assert!(a.clone().into_result().is_ok());

        let mut b = ValidationErrors::new();
        b.add("title", "is too long");
        a.merge(b);
        assert_eq!(a.get("title").map(Vec::len), Some(1));
        assert!(a.into_result().is_err());
    }

    #[test]
    fn test_http_error_display_includes_cause() {
        let err = PlanError::Http {
            status: 500,
            message: Some("Failed to update chantier".into()),
        };
        assert_eq!(err.to_string(), "HTTP error 500: Failed to update chantier");

        let bare = PlanError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(bare.to_string(), "HTTP error 502: no details");
    }

    #[test]
    fn test_error_classification() {
        assert!(PlanError::Network("connection refused".into()).is_transient());
        assert!(PlanError::Http { status: 503, message: None }.is_transient());
        assert!(!PlanError::Http { status: 400, message: None }.is_transient());
        assert!(PlanError::not_found("Chantier", "abc").is_not_found());
        assert!(!PlanError::Cache("disk full".into()).is_transient());
    }
}
