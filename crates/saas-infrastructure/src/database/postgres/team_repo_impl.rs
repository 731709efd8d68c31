// ============================================================================
// SaaS Infrastructure - PostgreSQL Team Repository
// File: crates/saas-infrastructure/src/database/postgres/team_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

use saas_core::domain::{
    NewTeam, NewTeamMember, Team, TeamMember, TeamMemberDetail, TeamMembership, TeamRole,
};
use saas_core::error::DomainError;
use saas_core::repositories::TeamRepository;

use super::db_error;

pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TeamRow {
    pub id: i32,
    pub name: String,
    pub organization_id: i32,
    pub plan_name: Option<String>,
    pub subscription_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            organization_id: row.organization_id,
            plan_name: row.plan_name,
            subscription_status: row.subscription_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TeamMemberRow {
    pub id: i32,
    pub user_id: i32,
    pub team_id: i32,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    pub team_id: i32,
    pub organization_id: i32,
    pub role: String,
}

#[derive(Debug, FromRow)]
struct MemberDetailRow {
    pub id: i32,
    pub user_id: i32,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: String,
}

fn parse_role(role: &str) -> TeamRole {
    TeamRole::parse(role).unwrap_or_else(|| {
        warn!("Unknown team role '{}', treating as member", role);
        TeamRole::Member
    })
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn create(&self, team: &NewTeam) -> Result<Team, DomainError> {
        let row: TeamRow = sqlx::query_as(
            r#"
            INSERT INTO teams (name, organization_id)
            VALUES ($1, $2)
            RETURNING id, name, organization_id, plan_name, subscription_status, created_at, updated_at
            "#,
        )
        .bind(&team.name)
        .bind(team.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("creating team", e))?;

        info!("Team created: {} in organization {}", row.id, row.organization_id);
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Team>, DomainError> {
        let row: Option<TeamRow> = sqlx::query_as(
            r#"
            SELECT id, name, organization_id, plan_name, subscription_status, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding team by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_first_by_organization(&self, organization_id: i32) -> Result<Option<Team>, DomainError> {
        let row: Option<TeamRow> = sqlx::query_as(
            r#"
            SELECT id, name, organization_id, plan_name, subscription_status, created_at, updated_at
            FROM teams
            WHERE organization_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding team by organization", e))?;

        Ok(row.map(Into::into))
    }

    async fn update_subscription(
        &self,
        team_id: i32,
        plan_name: Option<&str>,
        subscription_status: Option<&str>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE teams
            SET plan_name = $2, subscription_status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(team_id)
        .bind(plan_name)
        .bind(subscription_status)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating team subscription", e))?;

        Ok(())
    }

    async fn find_membership(&self, user_id: i32) -> Result<Option<TeamMembership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT tm.team_id, t.organization_id, tm.role
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE tm.user_id = $1
            ORDER BY tm.id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding membership", e))?;

        Ok(row.map(|r| TeamMembership {
            team_id: r.team_id,
            organization_id: r.organization_id,
            role: parse_role(&r.role),
        }))
    }

    async fn add_member(&self, member: &NewTeamMember) -> Result<TeamMember, DomainError> {
        let row: TeamMemberRow = sqlx::query_as(
            r#"
            INSERT INTO team_members (user_id, team_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, team_id, role, joined_at
            "#,
        )
        .bind(member.user_id)
        .bind(member.team_id)
        .bind(member.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("adding team member", e))?;

        Ok(TeamMember {
            id: row.id,
            user_id: row.user_id,
            team_id: row.team_id,
            role: parse_role(&row.role),
            joined_at: row.joined_at,
        })
    }

    async fn remove_member(&self, member_id: i32, team_id: i32) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1 AND team_id = $2")
            .bind(member_id)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("removing team member", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_user_from_team(&self, user_id: i32, team_id: i32) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM team_members WHERE user_id = $1 AND team_id = $2")
            .bind(user_id)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("removing user from team", e))?;

        Ok(())
    }

    async fn list_members(&self, team_id: i32) -> Result<Vec<TeamMemberDetail>, DomainError> {
        let rows: Vec<MemberDetailRow> = sqlx::query_as(
            r#"
            SELECT tm.id, tm.user_id, tm.role, tm.joined_at, u.name, u.email
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing team members", e))?;

        Ok(rows
            .into_iter()
            .map(|r| TeamMemberDetail {
                id: r.id,
                user_id: r.user_id,
                role: parse_role(&r.role),
                joined_at: r.joined_at,
                name: r.name,
                email: r.email,
            })
            .collect())
    }
}
