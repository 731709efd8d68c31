//! Repository traits (ports)

pub mod user_repository;
pub mod organization_repository;
pub mod team_repository;
pub mod invitation_repository;
pub mod billing_repository;
pub mod activity_repository;
pub mod memory;

use std::sync::Arc;

pub use user_repository::UserRepository;
pub use organization_repository::OrganizationRepository;
pub use team_repository::TeamRepository;
pub use invitation_repository::InvitationRepository;
pub use billing_repository::{ActiveBillingLink, BillingRepository};
pub use activity_repository::ActivityLogRepository;
pub use memory::MemoryStore;

/// Every repository the services need, injected once at startup.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub billings: Arc<dyn BillingRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
}

impl Repositories {
    /// All ports backed by one shared in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            organizations: store.clone(),
            teams: store.clone(),
            invitations: store.clone(),
            billings: store.clone(),
            activity: store,
        }
    }
}
