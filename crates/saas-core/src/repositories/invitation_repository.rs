//! Invitation repository trait (port)

use async_trait::async_trait;
use crate::domain::{Invitation, NewInvitation};
use crate::error::DomainError;

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, invitation: &NewInvitation) -> Result<Invitation, DomainError>;
    /// Pending invitation `id` addressed to `email`.
    async fn find_pending(&self, id: i32, email: &str) -> Result<Option<Invitation>, DomainError>;
    /// Flips `pending -> accepted`; returns `false` if it was no longer pending.
    async fn accept(&self, id: i32) -> Result<bool, DomainError>;
}
