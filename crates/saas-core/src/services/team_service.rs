//! Team membership, invitations and the activity feed

use tracing::{debug, info};

use saas_shared::constants::RECENT_ACTIVITY_LIMIT;

use crate::domain::{ActivityLog, ActivityType, Invitation, NewInvitation, TeamRole, TeamWithMembers, User};
use crate::error::DomainError;
use crate::repositories::Repositories;

use super::ActivityService;

pub struct TeamService {
    repos: Repositories,
    activity: ActivityService,
}

impl TeamService {
    pub fn new(repos: Repositories) -> Self {
        let activity = ActivityService::new(repos.activity.clone());
        Self { repos, activity }
    }

    /// The user's team with its members, or `None` when the user has no team.
    pub async fn team_for_user(&self, user_id: i32) -> Result<Option<TeamWithMembers>, DomainError> {
        let Some(membership) = self.repos.teams.find_membership(user_id).await? else {
            return Ok(None);
        };
        let team = self
            .repos
            .teams
            .find_by_id(membership.team_id)
            .await?
            .ok_or(DomainError::TeamNotFound)?;
        let members = self.repos.teams.list_members(team.id).await?;
        Ok(Some(TeamWithMembers { team, members }))
    }

    /// Removes `member_id` from the caller's own team.
    pub async fn remove_member(
        &self,
        user: &User,
        member_id: i32,
        ip_address: Option<&str>,
    ) -> Result<(), DomainError> {
        let membership = self
            .repos
            .teams
            .find_membership(user.id)
            .await?
            .ok_or(DomainError::TeamNotFound)?;

        let removed = self.repos.teams.remove_member(member_id, membership.team_id).await?;
        if !removed {
            debug!("Member {} is not in team {}", member_id, membership.team_id);
        }
        self.activity
            .record(
                Some(membership.team_id),
                user.id,
                ActivityType::RemoveTeamMember,
                ip_address,
            )
            .await?;

        info!("User {} removed member {} from team {}", user.id, member_id, membership.team_id);
        Ok(())
    }

    pub async fn invite_member(
        &self,
        user: &User,
        email: &str,
        role: TeamRole,
        ip_address: Option<&str>,
    ) -> Result<Invitation, DomainError> {
        let membership = self
            .repos
            .teams
            .find_membership(user.id)
            .await?
            .ok_or(DomainError::TeamNotFound)?;

        let invitation = NewInvitation {
            team_id: membership.team_id,
            organization_id: membership.organization_id,
            email: email.trim().to_string(),
            role,
            invited_by: user.id,
        };
        let (created, _) = tokio::try_join!(
            self.repos.invitations.create(&invitation),
            self.activity.record(
                Some(membership.team_id),
                user.id,
                ActivityType::InviteTeamMember,
                ip_address
            ),
        )?;

        info!("User {} invited a {} to team {}", user.id, role.as_str(), membership.team_id);
        Ok(created)
    }

    pub async fn recent_activity(&self, user_id: i32) -> Result<Vec<ActivityLog>, DomainError> {
        self.activity.recent_for_user(user_id, RECENT_ACTIVITY_LIMIT).await
    }
}
