//! Base contract for chantiers

use cp_core::dates::DateValue;
use cp_core::error::ValidationErrors;
use cp_models::Chantier;
use validator::Validate;

use crate::base::{merge_derived_errors, Contract, ValidationResult};

/// Validations shared by create and update
#[derive(Debug, Default, Clone)]
pub struct ChantierBaseContract {
    roster: Option<Vec<String>>,
}

impl ChantierBaseContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict assignees to the given team roster
    pub fn with_roster(roster: &[String]) -> Self {
        Self {
            roster: Some(roster.to_vec()),
        }
    }

    /// Validate title is present
    pub fn validate_title(&self, title: &str, errors: &mut ValidationErrors) {
        if title.trim().is_empty() {
            errors.add("title", "can't be blank");
        }
    }

    /// Validate a required date is present and readable
    pub fn validate_date(&self, field: &str, date: &DateValue, errors: &mut ValidationErrors) {
        if date.is_missing() {
            errors.add(field, "can't be blank");
        } else if !date.is_valid() {
            errors.add(field, "is not a valid date");
        }
    }

    /// A job can't be grouped under itself
    pub fn validate_parent(&self, entity: &Chantier, errors: &mut ValidationErrors) {
        if let (Some(id), Some(parent)) = (entity.id.as_deref(), entity.parent_id()) {
            if id == parent {
                errors.add("parentChantierId", "can't reference the chantier itself");
            }
        }
    }

    pub fn validate_assignees(&self, assignees: &[String], errors: &mut ValidationErrors) {
        let Some(roster) = &self.roster else {
            return;
        };
        for name in assignees {
            if !roster.iter().any(|member| member == name) {
                errors.add("assignees", format!("{} is not in the team roster", name));
            }
        }
    }
}

impl Contract<Chantier> for ChantierBaseContract {
    fn validate(&self, entity: &Chantier) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_title(&entity.title, &mut errors);
        self.validate_date("startDate", &entity.start_date, &mut errors);
        self.validate_date("endDate", &entity.end_date, &mut errors);
        self.validate_parent(entity, &mut errors);
        self.validate_assignees(&entity.assignees, &mut errors);
        merge_derived_errors(entity.validate(), &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_chantier() {
        let contract = ChantierBaseContract::new();
        let job = Chantier::new("Roof repair", "2024-03-01", "2024-03-03");
        assert!(contract.validate(&job).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let contract = ChantierBaseContract::new();
        let job = Chantier::new("  ", "", "31/12/2024");

        let errors = contract.validate(&job).unwrap_err();
        assert_eq!(errors.get("title"), Some(&vec!["can't be blank".to_string()]));
        assert_eq!(errors.get("startDate"), Some(&vec!["can't be blank".to_string()]));
        assert_eq!(
            errors.get("endDate"),
            Some(&vec!["is not a valid date".to_string()])
        );
    }

    #[test]
    fn test_inverted_range_is_accepted() {
        let contract = ChantierBaseContract::new();
        let job = Chantier::new("Legacy", "2024-03-05", "2024-03-01");
        assert!(contract.validate(&job).is_ok());
    }

    #[test]
    fn test_self_parent_and_roster() {
        let roster = vec!["wang".to_string(), "he".to_string()];
        let contract = ChantierBaseContract::with_roster(&roster);
        let job = Chantier::new("Loop", "2024-03-01", "2024-03-01")
            .with_id("65f1c2a9e4b0a1b2c3d4e5f6")
            .with_parent("65f1c2a9e4b0a1b2c3d4e5f6")
            .with_assignees(["wang", "zhou"]);

        let errors = contract.validate(&job).unwrap_err();
        assert!(errors.has_error("parentChantierId"));
        assert_eq!(
            errors.get("assignees"),
            Some(&vec!["zhou is not in the team roster".to_string()])
        );
    }

    #[test]
    fn test_contact_email_format() {
        let contract = ChantierBaseContract::new();
        let mut job = Chantier::new("Facade", "2024-03-01", "2024-03-02");
        job.contact_email = Some("nobody".into());

        let errors = contract.validate(&job).unwrap_err();
        assert!(errors.has_error("contactEmail"));
    }
}
