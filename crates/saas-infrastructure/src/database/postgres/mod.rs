//! PostgreSQL repository implementations

pub mod user_repo_impl;
pub mod organization_repo_impl;
pub mod team_repo_impl;
pub mod invitation_repo_impl;
pub mod billing_repo_impl;
pub mod activity_repo_impl;

use saas_core::error::DomainError;
use tracing::error;

pub use user_repo_impl::PgUserRepository;
pub use organization_repo_impl::PgOrganizationRepository;
pub use team_repo_impl::PgTeamRepository;
pub use invitation_repo_impl::PgInvitationRepository;
pub use billing_repo_impl::PgBillingRepository;
pub use activity_repo_impl::PgActivityLogRepository;

/// Logs a failed query and converts it into a `DomainError`.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
