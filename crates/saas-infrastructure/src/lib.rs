//! # SaaS Infrastructure
//!
//! PostgreSQL repositories and the Stripe billing adapter.

pub mod database;
pub mod billing;

pub use database::{create_pool, postgres_repositories, run_migrations};
pub use billing::{StripeClient, WebhookEvent, WebhookVerifier};
