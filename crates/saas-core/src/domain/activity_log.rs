//! Append-only activity log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    SignUp,
    SignIn,
    SignOut,
    UpdatePassword,
    DeleteAccount,
    UpdateAccount,
    CreateTeam,
    RemoveTeamMember,
    InviteTeamMember,
    AcceptInvitation,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::SignUp => "SIGN_UP",
            ActivityType::SignIn => "SIGN_IN",
            ActivityType::SignOut => "SIGN_OUT",
            ActivityType::UpdatePassword => "UPDATE_PASSWORD",
            ActivityType::DeleteAccount => "DELETE_ACCOUNT",
            ActivityType::UpdateAccount => "UPDATE_ACCOUNT",
            ActivityType::CreateTeam => "CREATE_TEAM",
            ActivityType::RemoveTeamMember => "REMOVE_TEAM_MEMBER",
            ActivityType::InviteTeamMember => "INVITE_TEAM_MEMBER",
            ActivityType::AcceptInvitation => "ACCEPT_INVITATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SIGN_UP" => Some(ActivityType::SignUp),
            "SIGN_IN" => Some(ActivityType::SignIn),
            "SIGN_OUT" => Some(ActivityType::SignOut),
            "UPDATE_PASSWORD" => Some(ActivityType::UpdatePassword),
            "DELETE_ACCOUNT" => Some(ActivityType::DeleteAccount),
            "UPDATE_ACCOUNT" => Some(ActivityType::UpdateAccount),
            "CREATE_TEAM" => Some(ActivityType::CreateTeam),
            "REMOVE_TEAM_MEMBER" => Some(ActivityType::RemoveTeamMember),
            "INVITE_TEAM_MEMBER" => Some(ActivityType::InviteTeamMember),
            "ACCEPT_INVITATION" => Some(ActivityType::AcceptInvitation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i32,
    pub team_id: i32,
    pub user_id: Option<i32>,
    pub action: ActivityType,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub team_id: i32,
    pub user_id: i32,
    pub action: ActivityType,
    pub ip_address: Option<String>,
}
