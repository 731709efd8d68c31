// ============================================================================
// SaaS Infrastructure - PostgreSQL Organization Repository
// File: crates/saas-infrastructure/src/database/postgres/organization_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

use saas_core::domain::{NewOrganization, Organization, OrganizationType};
use saas_core::error::DomainError;
use saas_core::repositories::OrganizationRepository;

use super::{db_error, is_unique_violation};

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    pub id: i32,
    pub name: String,
    pub website: Option<String>,
    pub subdomain: String,
    #[sqlx(rename = "type")]
    pub org_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            website: row.website,
            subdomain: row.subdomain,
            org_type: OrganizationType::parse(&row.org_type).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT id, name, website, subdomain, type, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding organization by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT id, name, website, subdomain, type, created_at, updated_at
            FROM organizations
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding organization by subdomain", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, organization: &NewOrganization) -> Result<Organization, DomainError> {
        let row: OrganizationRow = sqlx::query_as(
            r#"
            INSERT INTO organizations (name, subdomain, type)
            VALUES ($1, $2, $3)
            RETURNING id, name, website, subdomain, type, created_at, updated_at
            "#,
        )
        .bind(&organization.name)
        .bind(&organization.subdomain)
        .bind(organization.org_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!("Subdomain already taken: {}", organization.subdomain);
                DomainError::SubdomainAlreadyExists(organization.subdomain.clone())
            } else {
                db_error("creating organization", e)
            }
        })?;

        info!("Organization created: {} ({})", row.id, row.subdomain);
        Ok(row.into())
    }
}
