// ============================================================================
// SaaS Infrastructure - PostgreSQL Invitation Repository
// File: crates/saas-infrastructure/src/database/postgres/invitation_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use saas_core::domain::{Invitation, InvitationStatus, NewInvitation, TeamRole};
use saas_core::error::DomainError;
use saas_core::repositories::InvitationRepository;

use super::db_error;

pub struct PgInvitationRepository {
    pool: PgPool,
}

impl PgInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    pub id: i32,
    pub team_id: i32,
    pub organization_id: i32,
    pub email: String,
    pub role: String,
    pub invited_by: i32,
    pub invited_at: DateTime<Utc>,
    pub status: String,
}

impl From<InvitationRow> for Invitation {
    fn from(row: InvitationRow) -> Self {
        Invitation {
            id: row.id,
            team_id: row.team_id,
            organization_id: row.organization_id,
            email: row.email,
            role: TeamRole::parse(&row.role).unwrap_or_default(),
            invited_by: row.invited_by,
            invited_at: row.invited_at,
            status: InvitationStatus::parse(&row.status).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl InvitationRepository for PgInvitationRepository {
    async fn create(&self, invitation: &NewInvitation) -> Result<Invitation, DomainError> {
        let row: InvitationRow = sqlx::query_as(
            r#"
            INSERT INTO invitations (team_id, organization_id, email, role, invited_by, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING id, team_id, organization_id, email, role, invited_by, invited_at, status
            "#,
        )
        .bind(invitation.team_id)
        .bind(invitation.organization_id)
        .bind(&invitation.email)
        .bind(invitation.role.as_str())
        .bind(invitation.invited_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("creating invitation", e))?;

        Ok(row.into())
    }

    async fn find_pending(&self, id: i32, email: &str) -> Result<Option<Invitation>, DomainError> {
        let row: Option<InvitationRow> = sqlx::query_as(
            r#"
            SELECT id, team_id, organization_id, email, role, invited_by, invited_at, status
            FROM invitations
            WHERE id = $1 AND email = $2 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding pending invitation", e))?;

        Ok(row.map(Into::into))
    }

    async fn accept(&self, id: i32) -> Result<bool, DomainError> {
        // Conditional on `pending` so two concurrent sign-ups cannot both consume it.
        let result = sqlx::query(
            "UPDATE invitations SET status = 'accepted' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("accepting invitation", e))?;

        Ok(result.rows_affected() == 1)
    }
}
