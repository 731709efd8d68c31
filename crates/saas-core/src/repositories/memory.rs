//! In-memory implementations of every repository port.
//!
//! Backs local development and tests. All tables live behind one mutex so a
//! multi-row operation such as [`BillingRepository::replace_active`] is atomic.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{
    ActivityLog, Billing, Invitation, InvitationStatus, NewActivityLog, NewBilling,
    NewInvitation, NewOrganization, NewTeam, NewTeamMember, NewUser, Organization, Team,
    TeamMember, TeamMemberDetail, TeamMembership, User,
};
use crate::error::DomainError;

use super::{
    ActiveBillingLink, ActivityLogRepository, BillingRepository, InvitationRepository,
    OrganizationRepository, TeamRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<User>,
    organizations: Vec<Organization>,
    teams: Vec<Team>,
    members: Vec<TeamMember>,
    invitations: Vec<Invitation>,
    billings: Vec<Billing>,
    activity: Vec<ActivityLog>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn billings_for_organization(&self, organization_id: i32) -> Vec<Billing> {
        self.tables
            .lock()
            .billings
            .iter()
            .filter(|b| b.organization_id == organization_id)
            .cloned()
            .collect()
    }

    pub fn invitation(&self, id: i32) -> Option<Invitation> {
        self.tables.lock().invitations.iter().find(|i| i.id == id).cloned()
    }

    pub fn user_including_deleted(&self, id: i32) -> Option<User> {
        self.tables.lock().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn team_members(&self, team_id: i32) -> Vec<TeamMember> {
        self.tables
            .lock()
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect()
    }

    pub fn activity_for_team(&self, team_id: i32) -> Vec<ActivityLog> {
        self.tables
            .lock()
            .activity
            .iter()
            .filter(|a| a.team_id == team_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.id == id && !u.is_deleted()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.email == email && !u.is_deleted()).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::EmailAlreadyExists(user.email.clone()));
        }
        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
            avatar: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFoundById(id))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: i32, name: &str, email: &str) -> Result<User, DomainError> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|u| u.email == email && u.id != id) {
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFoundById(id))?;
        user.name = Some(name.to_string());
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: i32) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFoundById(id))?;
        user.email = user.tombstone_email();
        user.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Organization>, DomainError> {
        Ok(self.tables.lock().organizations.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Organization>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.organizations.iter().find(|o| o.subdomain == subdomain).cloned())
    }

    async fn create(&self, organization: &NewOrganization) -> Result<Organization, DomainError> {
        let mut tables = self.tables.lock();
        if tables.organizations.iter().any(|o| o.subdomain == organization.subdomain) {
            return Err(DomainError::SubdomainAlreadyExists(organization.subdomain.clone()));
        }
        let now = Utc::now();
        let created = Organization {
            id: tables.next_id(),
            name: organization.name.clone(),
            website: None,
            subdomain: organization.subdomain.clone(),
            org_type: organization.org_type,
            created_at: now,
            updated_at: now,
        };
        tables.organizations.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn create(&self, team: &NewTeam) -> Result<Team, DomainError> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        let created = Team {
            id: tables.next_id(),
            name: team.name.clone(),
            organization_id: team.organization_id,
            plan_name: None,
            subscription_status: None,
            created_at: now,
            updated_at: now,
        };
        tables.teams.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Team>, DomainError> {
        Ok(self.tables.lock().teams.iter().find(|t| t.id == id).cloned())
    }

    async fn find_first_by_organization(&self, organization_id: i32) -> Result<Option<Team>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .teams
            .iter()
            .filter(|t| t.organization_id == organization_id)
            .min_by_key(|t| t.id)
            .cloned())
    }

    async fn update_subscription(
        &self,
        team_id: i32,
        plan_name: Option<&str>,
        subscription_status: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let team = tables
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(DomainError::TeamNotFound)?;
        team.plan_name = plan_name.map(str::to_string);
        team.subscription_status = subscription_status.map(str::to_string);
        team.updated_at = Utc::now();
        Ok(())
    }

    async fn find_membership(&self, user_id: i32) -> Result<Option<TeamMembership>, DomainError> {
        let tables = self.tables.lock();
        let membership = tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .min_by_key(|m| m.id)
            .and_then(|m| {
                tables.teams.iter().find(|t| t.id == m.team_id).map(|t| TeamMembership {
                    team_id: t.id,
                    organization_id: t.organization_id,
                    role: m.role,
                })
            });
        Ok(membership)
    }

    async fn add_member(&self, member: &NewTeamMember) -> Result<TeamMember, DomainError> {
        let mut tables = self.tables.lock();
        let created = TeamMember {
            id: tables.next_id(),
            user_id: member.user_id,
            team_id: member.team_id,
            role: member.role,
            joined_at: Utc::now(),
        };
        tables.members.push(created.clone());
        Ok(created)
    }

    async fn remove_member(&self, member_id: i32, team_id: i32) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock();
        let before = tables.members.len();
        tables.members.retain(|m| !(m.id == member_id && m.team_id == team_id));
        Ok(tables.members.len() != before)
    }

    async fn remove_user_from_team(&self, user_id: i32, team_id: i32) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        tables.members.retain(|m| !(m.user_id == user_id && m.team_id == team_id));
        Ok(())
    }

    async fn list_members(&self, team_id: i32) -> Result<Vec<TeamMemberDetail>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| {
                tables.users.iter().find(|u| u.id == m.user_id).map(|u| TeamMemberDetail {
                    id: m.id,
                    user_id: u.id,
                    role: m.role,
                    joined_at: m.joined_at,
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl InvitationRepository for MemoryStore {
    async fn create(&self, invitation: &NewInvitation) -> Result<Invitation, DomainError> {
        let mut tables = self.tables.lock();
        let created = Invitation {
            id: tables.next_id(),
            team_id: invitation.team_id,
            organization_id: invitation.organization_id,
            email: invitation.email.clone(),
            role: invitation.role,
            invited_by: invitation.invited_by,
            invited_at: Utc::now(),
            status: InvitationStatus::Pending,
        };
        tables.invitations.push(created.clone());
        Ok(created)
    }

    async fn find_pending(&self, id: i32, email: &str) -> Result<Option<Invitation>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .invitations
            .iter()
            .find(|i| i.id == id && i.email == email && i.is_pending())
            .cloned())
    }

    async fn accept(&self, id: i32) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock();
        match tables.invitations.iter_mut().find(|i| i.id == id && i.is_pending()) {
            Some(invitation) => {
                invitation.status = InvitationStatus::Accepted;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn find_active_by_organization(&self, organization_id: i32) -> Result<Option<Billing>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .billings
            .iter()
            .find(|b| b.organization_id == organization_id && b.is_active)
            .cloned())
    }

    async fn find_active_by_customer(&self, customer_id: &str) -> Result<Option<ActiveBillingLink>, DomainError> {
        let tables = self.tables.lock();
        let link = tables
            .billings
            .iter()
            .filter(|b| b.is_active && b.customer_id.as_deref() == Some(customer_id))
            .find_map(|b| {
                tables
                    .teams
                    .iter()
                    .filter(|t| t.organization_id == b.organization_id)
                    .min_by_key(|t| t.id)
                    .map(|t| ActiveBillingLink {
                        billing: b.clone(),
                        team_id: t.id,
                    })
            });
        Ok(link)
    }

    async fn replace_active(&self, billing: &NewBilling) -> Result<Billing, DomainError> {
        let mut tables = self.tables.lock();
        let now = Utc::now();
        for existing in tables
            .billings
            .iter_mut()
            .filter(|b| b.organization_id == billing.organization_id)
        {
            existing.is_active = false;
            existing.updated_at = now;
        }
        let created = Billing {
            id: tables.next_id(),
            organization_id: billing.organization_id,
            provider: billing.provider.clone(),
            customer_id: Some(billing.customer_id.clone()),
            subscription_id: Some(billing.subscription_id.clone()),
            product_id: Some(billing.product_id.clone()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.billings.push(created.clone());
        Ok(created)
    }

    async fn update_subscription(
        &self,
        id: i32,
        subscription_id: &str,
        product_id: &str,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let billing = tables
            .billings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DomainError::BillingNotFound)?;
        billing.subscription_id = Some(subscription_id.to_string());
        billing.product_id = Some(product_id.to_string());
        billing.updated_at = Utc::now();
        Ok(())
    }

    async fn deactivate(&self, id: i32) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let billing = tables
            .billings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DomainError::BillingNotFound)?;
        billing.is_active = false;
        billing.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryStore {
    async fn append(&self, entry: &NewActivityLog) -> Result<(), DomainError> {
        let mut tables = self.tables.lock();
        let row = ActivityLog {
            id: tables.next_id(),
            team_id: entry.team_id,
            user_id: Some(entry.user_id),
            action: entry.action,
            timestamp: Utc::now(),
            ip_address: entry.ip_address.clone(),
        };
        tables.activity.push(row);
        Ok(())
    }

    async fn recent_for_user(&self, user_id: i32, limit: i64) -> Result<Vec<ActivityLog>, DomainError> {
        let tables = self.tables.lock();
        let mut rows: Vec<ActivityLog> = tables
            .activity
            .iter()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewOrganization, TeamRole};

    #[tokio::test]
    async fn test_replace_active_keeps_single_active_row() {
        let store = MemoryStore::new();
        for sub in ["sub_1", "sub_2", "sub_3"] {
            store
                .replace_active(&NewBilling {
                    organization_id: 1,
                    provider: "stripe".into(),
                    customer_id: "cus_1".into(),
                    subscription_id: sub.into(),
                    product_id: "prod_1".into(),
                })
                .await
                .unwrap();
        }

        let rows = store.billings_for_organization(1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|b| b.is_active).count(), 1);
        let active = store.find_active_by_organization(1).await.unwrap().unwrap();
        assert_eq!(active.subscription_id.as_deref(), Some("sub_3"));
    }

    #[tokio::test]
    async fn test_invitation_accepted_once() {
        let store = MemoryStore::new();
        let invitation = InvitationRepository::create(
            &store,
            &NewInvitation {
                team_id: 1,
                organization_id: 1,
                email: "e@x.com".into(),
                role: TeamRole::Member,
                invited_by: 1,
            },
        )
        .await
        .unwrap();

        assert!(store.accept(invitation.id).await.unwrap());
        assert!(!store.accept(invitation.id).await.unwrap());
        assert!(store.find_pending(invitation.id, "e@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_subdomain_rejected() {
        let store = MemoryStore::new();
        let org = NewOrganization::personal("A", "a").unwrap();
        OrganizationRepository::create(&store, &org).await.unwrap();
        let err = OrganizationRepository::create(&store, &org).await.unwrap_err();
        assert!(matches!(err, DomainError::SubdomainAlreadyExists(_)));
    }
}
