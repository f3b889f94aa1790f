//! Domain error shared by every crate. The API layer maps each variant to
//! one HTTP status.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A row the caller referenced does not exist, or is not visible to them.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Bad input, a rule of the program, or a date outside its window.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request is well-formed but the project is in the wrong state.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but lacking the role or permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a field-level validation error (`field: message`).
    pub fn field(field: &str, message: impl std::fmt::Display) -> Self {
        CoreError::Validation(format!("{field}: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_name_the_field() {
        let err = CoreError::field("aid_requested", "exceeds the program maximum of 1500");
        assert_eq!(
            err.to_string(),
            "Validation failed: aid_requested: exceeds the program maximum of 1500"
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = CoreError::NotFound { entity: "Project", id: 7 };
        assert_eq!(err.to_string(), "Project 7 not found");
    }
}
