//! Base contract system

use cp_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Copy the messages of a `validator` derive into the contract's error
/// collection, keyed by wire field name.
pub fn merge_derived_errors(
    derived: Result<(), validator::ValidationErrors>,
    errors: &mut ValidationErrors,
) {
    let Err(derived) = derived else {
        return;
    };
    for (field, field_errors) in derived.field_errors() {
        for error in field_errors {
            let message = match &*error.code {
                "email" => "is not a valid email address".to_string(),
                "length" => "is too long".to_string(),
                code => error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("is invalid ({})", code)),
            };
            errors.add(camel_case(field), message);
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
