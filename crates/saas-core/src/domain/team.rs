// ============================================================================
// SaaS Core - Team & Team Member Entities
// File: crates/saas-core/src/domain/team.rs
// Description: Membership container with denormalized plan fields
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role of a user inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    #[default]
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(TeamRole::Owner),
            "member" => Some(TeamRole::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub organization_id: i32,
    pub plan_name: Option<String>,
    pub subscription_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewTeam {
    #[validate(length(min = 1, max = 100, message = "Team name must be between 1 and 100 characters"))]
    pub name: String,
    pub organization_id: i32,
}

impl NewTeam {
    /// Personal team created at sign-up: `"{name}'s Team"`.
    pub fn personal(owner_name: &str, organization_id: i32) -> Result<Self, validator::ValidationErrors> {
        let team = Self {
            name: format!("{}'s Team", owner_name.trim()),
            organization_id,
        };

        team.validate()?;
        Ok(team)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i32,
    pub user_id: i32,
    pub team_id: i32,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub user_id: i32,
    pub team_id: i32,
    pub role: TeamRole,
}

/// A user's link to their team and the team's organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamMembership {
    pub team_id: i32,
    pub organization_id: i32,
    pub role: TeamRole,
}

/// Member row joined with the member's public user fields.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMemberDetail {
    pub id: i32,
    pub user_id: i32,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMemberDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_team_name() {
        let team = NewTeam::personal("Ada Lovelace", 1).unwrap();
        assert_eq!(team.name, "Ada Lovelace's Team");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(TeamRole::parse("owner"), Some(TeamRole::Owner));
        assert_eq!(TeamRole::parse("admin"), None);
        assert_eq!(TeamRole::default(), TeamRole::Member);
    }
}
