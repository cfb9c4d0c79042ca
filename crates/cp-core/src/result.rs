//! Result type aliases and helpers for "already absent" semantics

use crate::error::PlanError;

/// Standard Result type for planning operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Treats a remote 404 as a success-equivalent outcome.
///
/// Update and delete flows consider a record the server no longer knows
/// about as already deleted: the caller reconciles locally instead of
/// surfacing an error.
pub trait NotFoundExt<T> {
    /// `Ok(Some(value))` on success, `Ok(None)` on not-found, other errors unchanged
    fn allow_not_found(self) -> PlanResult<Option<T>>;
}

impl<T> NotFoundExt<T> for PlanResult<T> {
    fn allow_not_found(self) -> PlanResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_not_found() {
        let ok: PlanResult<u8> = Ok(1);
        assert_eq!(ok.allow_not_found().unwrap(), Some(1));

        let missing: PlanResult<u8> = Err(PlanError::not_found("Chantier", "x"));
        assert_eq!(missing.allow_not_found().unwrap(), None);

        let failed: PlanResult<u8> = Err(PlanError::Network("reset".into()));
        assert!(failed.allow_not_found().is_err());
    }
}
