// ============================================================================
// SaaS Infrastructure - PostgreSQL Billing Repository
// File: crates/saas-infrastructure/src/database/postgres/billing_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use saas_core::domain::{Billing, NewBilling};
use saas_core::error::DomainError;
use saas_core::repositories::{ActiveBillingLink, BillingRepository};

use super::db_error;

pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BillingRow {
    pub id: i32,
    pub organization_id: i32,
    pub pg_provider: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub product_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BillingRow> for Billing {
    fn from(row: BillingRow) -> Self {
        Billing {
            id: row.id,
            organization_id: row.organization_id,
            provider: row.pg_provider,
            customer_id: row.customer_id,
            subscription_id: row.subscription_id,
            product_id: row.product_id,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BillingLinkRow {
    #[sqlx(flatten)]
    pub billing: BillingRow,
    pub team_id: i32,
}

#[async_trait]
impl BillingRepository for PgBillingRepository {
    async fn find_active_by_organization(&self, organization_id: i32) -> Result<Option<Billing>, DomainError> {
        let row: Option<BillingRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, pg_provider, customer_id, subscription_id, product_id,
                   is_active, created_at, updated_at
            FROM billings
            WHERE organization_id = $1 AND is_active
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding active billing", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_customer(&self, customer_id: &str) -> Result<Option<ActiveBillingLink>, DomainError> {
        let row: Option<BillingLinkRow> = sqlx::query_as(
            r#"
            SELECT b.id, b.organization_id, b.pg_provider, b.customer_id, b.subscription_id,
                   b.product_id, b.is_active, b.created_at, b.updated_at,
                   t.id AS team_id
            FROM billings b
            JOIN teams t ON t.organization_id = b.organization_id
            WHERE b.customer_id = $1 AND b.is_active
            ORDER BY t.id
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding billing by customer", e))?;

        Ok(row.map(|r| ActiveBillingLink {
            billing: r.billing.into(),
            team_id: r.team_id,
        }))
    }

    async fn replace_active(&self, billing: &NewBilling) -> Result<Billing, DomainError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting billing transaction", e))?;

        sqlx::query(
            r#"
            UPDATE billings
            SET is_active = FALSE, updated_at = NOW()
            WHERE organization_id = $1 AND is_active
            "#,
        )
        .bind(billing.organization_id)
        .execute(&mut *transaction)
        .await
        .map_err(|e| db_error("deactivating billing", e))?;

        let row: BillingRow = sqlx::query_as(
            r#"
            INSERT INTO billings (organization_id, pg_provider, customer_id, subscription_id, product_id, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, organization_id, pg_provider, customer_id, subscription_id, product_id,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(billing.organization_id)
        .bind(&billing.provider)
        .bind(&billing.customer_id)
        .bind(&billing.subscription_id)
        .bind(&billing.product_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|e| db_error("inserting billing", e))?;

        transaction
            .commit()
            .await
            .map_err(|e| db_error("committing billing transaction", e))?;

        info!("Billing {} is now active for organization {}", row.id, row.organization_id);
        Ok(row.into())
    }

    async fn update_subscription(
        &self,
        id: i32,
        subscription_id: &str,
        product_id: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE billings
            SET subscription_id = $2, product_id = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(subscription_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("updating billing subscription", e))?;

        Ok(())
    }

    async fn deactivate(&self, id: i32) -> Result<(), DomainError> {
        sqlx::query("UPDATE billings SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("deactivating billing", e))?;

        Ok(())
    }
}
