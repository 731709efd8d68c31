//! Invitation entity: a pending offer to join a team

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::team::TeamRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvitationStatus::Pending),
            "accepted" => Some(InvitationStatus::Accepted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i32,
    pub team_id: i32,
    pub organization_id: i32,
    pub email: String,
    pub role: TeamRole,
    pub invited_by: i32,
    pub invited_at: DateTime<Utc>,
    pub status: InvitationStatus,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub team_id: i32,
    pub organization_id: i32,
    pub email: String,
    pub role: TeamRole,
    pub invited_by: i32,
}
