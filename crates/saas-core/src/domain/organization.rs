// ============================================================================
// SaaS Core - Organization Entity
// File: crates/saas-core/src/domain/organization.rs
// Description: Tenant root owning teams and billing state
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_SUBDOMAIN_LENGTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    #[default]
    Personal,
    Company,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Personal => "personal",
            OrganizationType::Company => "company",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(OrganizationType::Personal),
            "company" => Some(OrganizationType::Company),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub website: Option<String>,
    pub subdomain: String,
    pub org_type: OrganizationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewOrganization {
    #[validate(length(min = 1, max = 100, message = "Organization name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Subdomain must be between 1 and 50 characters"))]
    pub subdomain: String,
    pub org_type: OrganizationType,
}

impl NewOrganization {
    pub fn personal(name: &str, subdomain: &str) -> Result<Self, validator::ValidationErrors> {
        let org = Self {
            name: name.trim().to_string(),
            subdomain: normalize_subdomain(subdomain),
            org_type: OrganizationType::Personal,
        };

        org.validate()?;
        Ok(org)
    }
}

/// Lowercases and replaces anything outside `[a-z0-9-]` with `-`.
pub fn normalize_subdomain(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .take(MAX_SUBDOMAIN_LENGTH)
        .collect()
}

/// Candidate subdomain for the `attempt`-th collision (`acme`, `acme-2`, `acme-3`, ...).
pub fn subdomain_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return base.to_string();
    }
    let suffix = format!("-{}", attempt);
    let keep = MAX_SUBDOMAIN_LENGTH.saturating_sub(suffix.len());
    let head: String = base.chars().take(keep).collect();
    format!("{}{}", head, suffix)
}
