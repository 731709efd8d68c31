// ============================================================================
// SaaS Core - User Entity
// File: crates/saas-core/src/domain/user.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn display_name(&self) -> String {
        match (&self.name, &self.first_name, &self.last_name) {
            (Some(n), _, _) if !n.is_empty() => n.clone(),
            (_, Some(f), Some(l)) => format!("{} {}", f, l),
            (_, Some(f), None) => f.clone(),
            _ => self.email.clone(),
        }
    }

    /// Email written on soft delete so the original address can be reused.
    pub fn tombstone_email(&self) -> String {
        format!("{}-{}-deleted", self.email, self.id)
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(max = 100, message = "First name too long"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name too long"))]
    pub last_name: Option<String>,
    #[validate(length(max = 100, message = "Name too long"))]
    pub name: Option<String>,
    pub password_hash: String,
    pub role: String,
}

impl NewUser {
    pub fn owner(
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: String,
    ) -> Result<Self, validator::ValidationErrors> {
        let first_name = first_name.trim().to_string();
        let last_name = last_name.trim().to_string();
        let user = Self {
            email: email.trim().to_string(),
            name: Some(format!("{} {}", first_name, last_name)),
            first_name: Some(first_name),
            last_name: Some(last_name),
            password_hash,
            role: "owner".to_string(),
        };

        user.validate()?;
        Ok(user)
    }
}
