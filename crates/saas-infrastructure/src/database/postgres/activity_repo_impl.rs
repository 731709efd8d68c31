// ============================================================================
// SaaS Infrastructure - PostgreSQL Activity Log Repository
// File: crates/saas-infrastructure/src/database/postgres/activity_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use saas_core::domain::{ActivityLog, ActivityType, NewActivityLog};
use saas_core::error::DomainError;
use saas_core::repositories::ActivityLogRepository;

use super::db_error;

pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActivityLogRow {
    pub id: i32,
    pub team_id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
}

impl ActivityLogRow {
    fn into_domain(self) -> Option<ActivityLog> {
        let Some(action) = ActivityType::parse(&self.action) else {
            warn!("Skipping activity {} with unknown action {}", self.id, self.action);
            return None;
        };
        Some(ActivityLog {
            id: self.id,
            team_id: self.team_id,
            user_id: self.user_id,
            action,
            timestamp: self.timestamp,
            ip_address: self.ip_address,
        })
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn append(&self, entry: &NewActivityLog) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (team_id, user_id, action, ip_address)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.team_id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("appending activity", e))?;

        Ok(())
    }

    async fn recent_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<ActivityLog>, DomainError> {
        let rows: Vec<ActivityLogRow> = sqlx::query_as(
            r#"
            SELECT id, team_id, user_id, action, timestamp, ip_address
            FROM activity_logs
            WHERE user_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing activity", e))?;

        Ok(rows.into_iter().filter_map(ActivityLogRow::into_domain).collect())
    }
}
