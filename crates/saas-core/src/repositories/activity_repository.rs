//! Activity log repository trait (port)

use async_trait::async_trait;
use crate::domain::{ActivityLog, NewActivityLog};
use crate::error::DomainError;

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: &NewActivityLog) -> Result<(), DomainError>;
    /// Newest first.
    async fn recent_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<ActivityLog>, DomainError>;
}
