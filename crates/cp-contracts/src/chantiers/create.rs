//! Create contract for chantiers

use cp_core::error::ValidationErrors;
use cp_models::Chantier;

use super::base::ChantierBaseContract;
use crate::base::{Contract, ValidationResult};

/// Contract for creating a new chantier
#[derive(Debug, Default, Clone)]
pub struct CreateChantierContract {
    base: ChantierBaseContract,
}

impl CreateChantierContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: &[String]) -> Self {
        Self {
            base: ChantierBaseContract::with_roster(roster),
        }
    }

    /// The store assigns ids; a draft must not carry one
    fn validate_new_record(&self, entity: &Chantier, errors: &mut ValidationErrors) {
        if entity.id.is_some() {
            errors.add_base("A new chantier can't already have an id");
        }
    }
}

impl Contract<Chantier> for CreateChantierContract {
    fn validate(&self, entity: &Chantier) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_new_record(entity, &mut errors);
        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_valid() {
        let contract = CreateChantierContract::new();
        let job = Chantier::new("Kitchen", "2024-05-01", "2024-05-04");
        assert!(contract.validate(&job).is_ok());
    }

    #[test]
    fn test_create_rejects_existing_id() {
        let contract = CreateChantierContract::new();
        let job = Chantier::new("Kitchen", "2024-05-01", "2024-05-04").with_id("abc");

        let errors = contract.validate(&job).unwrap_err();
        assert_eq!(errors.base_errors.len(), 1);
    }
}
