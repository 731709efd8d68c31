//! # SaaS Core
//!
//! Domain entities, repository and billing-provider ports, and the services
//! that implement accounts, teams and subscription reconciliation.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod billing_provider;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
