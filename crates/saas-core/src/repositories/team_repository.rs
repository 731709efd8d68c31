//! Team and membership repository trait (port)

use async_trait::async_trait;
use crate::domain::{NewTeam, NewTeamMember, Team, TeamMember, TeamMemberDetail, TeamMembership};
use crate::error::DomainError;

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn create(&self, team: &NewTeam) -> Result<Team, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Team>, DomainError>;
    /// First team of an organization (lowest id).
    async fn find_first_by_organization(&self, organization_id: i32) -> Result<Option<Team>, DomainError>;
    /// Mirrors the billing plan onto the team row.
    async fn update_subscription(
        &self,
        team_id: i32,
        plan_name: Option<&str>,
        subscription_status: Option<&str>,
    ) -> Result<(), DomainError>;

    /// The user's first membership joined with its team's organization.
    async fn find_membership(&self, user_id: i32) -> Result<Option<TeamMembership>, DomainError>;
    async fn add_member(&self, member: &NewTeamMember) -> Result<TeamMember, DomainError>;
    /// Deletes member `member_id` only if it belongs to `team_id`.
    async fn remove_member(&self, member_id: i32, team_id: i32) -> Result<bool, DomainError>;
    async fn remove_user_from_team(&self, user_id: i32, team_id: i32) -> Result<(), DomainError>;
    async fn list_members(&self, team_id: i32) -> Result<Vec<TeamMemberDetail>, DomainError>;
}
