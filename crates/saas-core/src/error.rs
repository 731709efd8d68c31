//! Domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFoundById(i32),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("New password matches the current password")]
    PasswordUnchanged,

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Subdomain already exists: {0}")]
    SubdomainAlreadyExists(String),

    #[error("Unable to generate unique subdomain")]
    UnableToGenerateUniqueSubdomain,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Invitation not found or already accepted")]
    InvitationUnavailable,

    #[error("Billing record not found")]
    BillingNotFound,

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_values()
            .flat_map(|errors| errors.iter())
            .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        DomainError::ValidationError(message)
    }
}

impl From<saas_security::password::PasswordError> for DomainError {
    fn from(err: saas_security::password::PasswordError) -> Self {
        DomainError::PasswordHashError(err.to_string())
    }
}
