//! Remote store errors

use cp_core::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status, with the server's `error` message when it sent one
    #[error("HTTP error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    /// 404 for the given id
    #[error("Chantier not found on server: {0}")]
    NotFound(String),

    /// The response body could not be read as expected
    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

impl From<RemoteError> for PlanError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => PlanError::Network(message),
            RemoteError::Status { status, message } => PlanError::Http { status, message },
            RemoteError::NotFound(id) => PlanError::not_found("Chantier", id),
            RemoteError::Decode(message) => PlanError::Network(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_plan_error() {
        let err: PlanError = RemoteError::NotFound("abc".into()).into();
        assert!(err.is_not_found());

        let err: PlanError = RemoteError::Status {
            status: 400,
            message: Some("Missing required fields (title, startDate, endDate)".into()),
        }
        .into();
        assert!(matches!(err, PlanError::Http { status: 400, .. }));
        assert!(err.to_string().contains("Missing required fields"));
    }
}
