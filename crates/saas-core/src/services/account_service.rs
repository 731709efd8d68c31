//! Self-service account management for a signed-in user

use std::sync::Arc;
use tracing::{info, warn};

use saas_security::{PasswordService, SessionManager};

use crate::domain::{ActivityType, User};
use crate::error::DomainError;
use crate::repositories::Repositories;

use super::ActivityService;

pub struct AccountService {
    repos: Repositories,
    sessions: Arc<SessionManager>,
    activity: ActivityService,
}

impl AccountService {
    pub fn new(repos: Repositories, sessions: Arc<SessionManager>) -> Self {
        let activity = ActivityService::new(repos.activity.clone());
        Self {
            repos,
            sessions,
            activity,
        }
    }

    /// Fails with `InvalidCredentials` when `current` is wrong and with
    /// `PasswordUnchanged` when `new` equals it.
    pub async fn update_password(
        &self,
        user: &User,
        current: &str,
        new: &str,
        ip_address: Option<&str>,
    ) -> Result<(), DomainError> {
        if !self.password_matches(user, current)? {
            warn!("Password change rejected for user {}: wrong current password", user.id);
            return Err(DomainError::InvalidCredentials);
        }
        if current == new {
            return Err(DomainError::PasswordUnchanged);
        }

        let new_hash = PasswordService::hash(new)?;
        let membership = self.repos.teams.find_membership(user.id).await?;
        tokio::try_join!(
            self.repos.users.update_password(user.id, &new_hash),
            self.activity.record(
                membership.map(|m| m.team_id),
                user.id,
                ActivityType::UpdatePassword,
                ip_address
            ),
        )?;

        info!("Password updated for user {}", user.id);
        Ok(())
    }

    pub async fn update_account(
        &self,
        user: &User,
        name: &str,
        email: &str,
        ip_address: Option<&str>,
    ) -> Result<User, DomainError> {
        let (membership, updated) = tokio::try_join!(
            self.repos.teams.find_membership(user.id),
            self.repos.users.update_profile(user.id, name.trim(), email.trim()),
        )?;
        self.activity
            .record(
                membership.map(|m| m.team_id),
                user.id,
                ActivityType::UpdateAccount,
                ip_address,
            )
            .await?;

        info!("Account updated for user {}", user.id);
        Ok(updated)
    }

    /// Soft-deletes the user, drops their team membership and returns the
    /// `Set-Cookie` value that removes the session.
    pub async fn delete_account(
        &self,
        user: &User,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<String, DomainError> {
        if !self.password_matches(user, password)? {
            warn!("Account deletion rejected for user {}: wrong password", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        let membership = self.repos.teams.find_membership(user.id).await?;
        self.activity
            .record(
                membership.map(|m| m.team_id),
                user.id,
                ActivityType::DeleteAccount,
                ip_address,
            )
            .await?;

        self.repos.users.soft_delete(user.id).await?;
        if let Some(membership) = membership {
            self.repos
                .teams
                .remove_user_from_team(user.id, membership.team_id)
                .await?;
        }

        info!("Account {} deleted", user.id);
        Ok(self.sessions.clear_cookie())
    }

    fn password_matches(&self, user: &User, password: &str) -> Result<bool, DomainError> {
        Ok(PasswordService::verify(password, &user.password_hash)?)
    }
}
