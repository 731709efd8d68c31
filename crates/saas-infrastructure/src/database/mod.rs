//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod postgres;

use std::sync::Arc;

use saas_core::repositories::Repositories;
use sqlx::PgPool;

pub use connection::{create_pool, run_migrations};
pub use postgres::{
    PgActivityLogRepository, PgBillingRepository, PgInvitationRepository,
    PgOrganizationRepository, PgTeamRepository, PgUserRepository,
};

/// Every repository port backed by the same pool.
pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        organizations: Arc::new(PgOrganizationRepository::new(pool.clone())),
        teams: Arc::new(PgTeamRepository::new(pool.clone())),
        invitations: Arc::new(PgInvitationRepository::new(pool.clone())),
        billings: Arc::new(PgBillingRepository::new(pool.clone())),
        activity: Arc::new(PgActivityLogRepository::new(pool)),
    }
}
