//! # SaaS Core - Domain Module
//! 
//! Domain entities for the SaaS application.

pub mod user;
pub mod organization;
pub mod team;
pub mod invitation;
pub mod billing;
pub mod activity_log;

// Re-export all entities and enums
pub use user::{NewUser, User};
pub use organization::{NewOrganization, Organization, OrganizationType};
pub use team::{
    NewTeam, NewTeamMember, Team, TeamMember, TeamMemberDetail, TeamMembership, TeamRole,
    TeamWithMembers,
};
pub use invitation::{Invitation, InvitationStatus, NewInvitation};
pub use billing::{Billing, NewBilling, SubscriptionStatus};
pub use activity_log::{ActivityLog, ActivityType, NewActivityLog};
