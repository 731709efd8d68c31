//! Team-scoped audit trail

use std::sync::Arc;
use tracing::debug;

use crate::domain::{ActivityLog, ActivityType, NewActivityLog};
use crate::error::DomainError;
use crate::repositories::ActivityLogRepository;

#[derive(Clone)]
pub struct ActivityService {
    activity: Arc<dyn ActivityLogRepository>,
}

impl ActivityService {
    pub fn new(activity: Arc<dyn ActivityLogRepository>) -> Self {
        Self { activity }
    }

    /// Appends an entry for `team_id`. Without a team there is nothing to scope
    /// the entry to and it is skipped.
    pub async fn record(
        &self,
        team_id: Option<i32>,
        user_id: i32,
        action: ActivityType,
        ip_address: Option<&str>,
    ) -> Result<(), DomainError> {
        let Some(team_id) = team_id else {
            debug!("Skipping {} for user {}: no team", action.as_str(), user_id);
            return Ok(());
        };

        self.activity
            .append(&NewActivityLog {
                team_id,
                user_id,
                action,
                ip_address: ip_address.map(str::to_string),
            })
            .await
    }

    pub async fn recent_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<ActivityLog>, DomainError> {
        self.activity.recent_for_user(user_id, limit).await
    }
}
