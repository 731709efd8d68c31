// ============================================================================
// SaaS Core - Authentication Service
// File: crates/saas-core/src/services/auth_service.rs
// ============================================================================
//! Sign-in, sign-up and sign-out

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use saas_security::session::IssuedSession;
use saas_security::{PasswordService, SessionManager};
use saas_shared::constants::MAX_SUBDOMAIN_ATTEMPTS;
use saas_shared::utils::{email_local_part, mask_email};

use crate::domain::organization::{normalize_subdomain, subdomain_candidate};
use crate::domain::{
    ActivityType, Invitation, NewOrganization, NewTeam, NewTeamMember, NewUser, Organization, TeamRole,
    User,
};
use crate::error::DomainError;
use crate::repositories::Repositories;

use super::ActivityService;

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub invite_id: Option<i32>,
}

/// A user who just received a fresh session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    /// Organization reached through the user's team, if any.
    pub organization_id: Option<i32>,
    pub session: IssuedSession,
}

/// Where a new user lands, decided before anything is written.
enum Placement {
    Invited(Invitation),
    Personal { team: NewTeam, subdomain: String },
}

pub struct AuthService {
    repos: Repositories,
    sessions: Arc<SessionManager>,
    activity: ActivityService,
}

impl AuthService {
    pub fn new(repos: Repositories, sessions: Arc<SessionManager>) -> Self {
        let activity = ActivityService::new(repos.activity.clone());
        Self {
            repos,
            sessions,
            activity,
        }
    }

    /// Resolves the user behind a `Cookie` header. Invalid, expired and absent
    /// sessions all resolve to `None`, as does a soft-deleted user.
    pub async fn current_user(&self, cookie_header: Option<&str>) -> Result<Option<User>, DomainError> {
        let Some(payload) = self.sessions.get_session(cookie_header) else {
            return Ok(None);
        };
        self.repos.users.find_by_id(payload.user_id).await
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<AuthenticatedUser, DomainError> {
        info!("Sign-in attempt for {}", mask_email(email));

        let user = self.repos.users.find_by_email(email).await?.ok_or_else(|| {
            warn!("Sign-in failed: unknown email {}", mask_email(email));
            DomainError::InvalidCredentials
        })?;

        let password_valid = PasswordService::verify(password, &user.password_hash).map_err(|e| {
            error!("Stored password hash for user {} is unreadable: {}", user.id, e);
            DomainError::InvalidCredentials
        })?;
        if !password_valid {
            warn!("Sign-in failed: wrong password for user {}", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        let membership = self.repos.teams.find_membership(user.id).await?;
        let (session, _) = tokio::try_join!(
            self.issue_session(user.id),
            self.activity.record(
                membership.map(|m| m.team_id),
                user.id,
                ActivityType::SignIn,
                ip_address
            ),
        )?;

        info!("Sign-in successful for user {}", user.id);
        Ok(AuthenticatedUser {
            user,
            organization_id: membership.map(|m| m.organization_id),
            session,
        })
    }

    /// Creates the user and attaches them to a team: the invited team when
    /// `invite_id` names a pending invitation for this email, otherwise a new
    /// personal organization with its first team.
    pub async fn sign_up(
        &self,
        request: &SignUpRequest,
        ip_address: Option<&str>,
    ) -> Result<AuthenticatedUser, DomainError> {
        let email = request.email.trim();
        info!("Sign-up attempt for {}", mask_email(email));

        // Resolved before any write.
        let invitation = match request.invite_id {
            Some(id) => Some(self.repos.invitations.find_pending(id, email).await?.ok_or_else(|| {
                warn!("Sign-up rejected: invitation {} unavailable for {}", id, mask_email(email));
                DomainError::InvitationUnavailable
            })?),
            None => None,
        };

        if self.repos.users.find_by_email(email).await?.is_some() {
            warn!("Sign-up rejected: {} already registered", mask_email(email));
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }

        let password_hash = PasswordService::hash(&request.password)?;
        let new_user = NewUser::owner(email, &request.first_name, &request.last_name, password_hash)?;
        let display_name = new_user.name.clone().unwrap_or_else(|| email.to_string());

        // Every row is validated and the invitation claimed before the first insert.
        let placement = match invitation {
            Some(invitation) => {
                if !self.repos.invitations.accept(invitation.id).await? {
                    warn!("Invitation {} was consumed concurrently", invitation.id);
                    return Err(DomainError::InvitationUnavailable);
                }
                Placement::Invited(invitation)
            }
            None => {
                let subdomain = normalize_subdomain(email_local_part(email));
                NewOrganization::personal(&display_name, &subdomain_candidate(&subdomain, 1))?;
                Placement::Personal {
                    team: NewTeam::personal(&display_name, 0)?,
                    subdomain,
                }
            }
        };

        let user = self.repos.users.create(&new_user).await?;
        let (team_id, organization_id, role, joined) = match placement {
            Placement::Invited(invitation) => (
                invitation.team_id,
                invitation.organization_id,
                invitation.role,
                ActivityType::AcceptInvitation,
            ),
            Placement::Personal { team, subdomain } => {
                let organization = self.create_personal_organization(&display_name, &subdomain).await?;
                let team = self
                    .repos
                    .teams
                    .create(&NewTeam {
                        organization_id: organization.id,
                        ..team
                    })
                    .await?;
                (team.id, organization.id, TeamRole::Owner, ActivityType::CreateTeam)
            }
        };

        let member = NewTeamMember {
            user_id: user.id,
            team_id,
            role,
        };
        let (_, _, _, session) = tokio::try_join!(
            self.repos.teams.add_member(&member),
            self.activity.record(Some(team_id), user.id, ActivityType::SignUp, ip_address),
            self.activity.record(Some(team_id), user.id, joined, ip_address),
            self.issue_session(user.id),
        )?;

        info!("Sign-up successful: user {} joined team {}", user.id, team_id);
        Ok(AuthenticatedUser {
            user,
            organization_id: Some(organization_id),
            session,
        })
    }

    /// Logs the sign-out and returns the `Set-Cookie` value that removes the session.
    pub async fn sign_out(&self, user_id: i32, ip_address: Option<&str>) -> Result<String, DomainError> {
        let membership = self.repos.teams.find_membership(user_id).await?;
        self.activity
            .record(membership.map(|m| m.team_id), user_id, ActivityType::SignOut, ip_address)
            .await?;
        info!("User {} signed out", user_id);
        Ok(self.sessions.clear_cookie())
    }

    async fn issue_session(&self, user_id: i32) -> Result<IssuedSession, DomainError> {
        self.sessions
            .set_session(user_id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))
    }

    async fn create_personal_organization(&self, name: &str, base: &str) -> Result<Organization, DomainError> {
        for attempt in 1..=MAX_SUBDOMAIN_ATTEMPTS {
            let candidate = subdomain_candidate(base, attempt);
            match self
                .repos
                .organizations
                .create(&NewOrganization::personal(name, &candidate)?)
                .await
            {
                Ok(organization) => return Ok(organization),
                Err(DomainError::SubdomainAlreadyExists(taken)) => {
                    debug!("Subdomain {} taken, trying next candidate", taken);
                }
                Err(e) => return Err(e),
            }
        }

        error!("No free subdomain for base '{}' after {} attempts", base, MAX_SUBDOMAIN_ATTEMPTS);
        Err(DomainError::UnableToGenerateUniqueSubdomain)
    }
}
