//! User repository trait (port)

use async_trait::async_trait;
use crate::domain::{NewUser, User};
use crate::error::DomainError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Live (not soft-deleted) user by id.
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;
    /// Live user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), DomainError>;
    async fn update_profile(&self, id: i32, name: &str, email: &str) -> Result<User, DomainError>;
    /// Sets `deleted_at` and rewrites the email to `{email}-{id}-deleted`.
    async fn soft_delete(&self, id: i32) -> Result<(), DomainError>;
}
