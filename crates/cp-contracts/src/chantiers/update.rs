//! Update contract for chantiers

use cp_core::error::ValidationErrors;
use cp_models::Chantier;

use super::base::ChantierBaseContract;
use crate::base::{Contract, ValidationResult};

/// Contract for updating an existing chantier
#[derive(Debug, Default, Clone)]
pub struct UpdateChantierContract {
    base: ChantierBaseContract,
}

impl UpdateChantierContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: &[String]) -> Self {
        Self {
            base: ChantierBaseContract::with_roster(roster),
        }
    }

    fn validate_persisted(&self, entity: &Chantier, errors: &mut ValidationErrors) {
        if entity.id.is_none() {
            errors.add("id", "can't be blank");
        }
    }
}

impl Contract<Chantier> for UpdateChantierContract {
    fn validate(&self, entity: &Chantier) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_persisted(entity, &mut errors);
        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        errors.into_result()
    }
}
