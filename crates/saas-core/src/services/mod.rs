//! Domain services (business logic)

pub mod activity_service;
pub mod auth_service;
pub mod account_service;
pub mod team_service;
pub mod billing_service;

pub use activity_service::ActivityService;
pub use auth_service::{AuthService, AuthenticatedUser, SignUpRequest};
pub use account_service::AccountService;
pub use team_service::TeamService;
pub use billing_service::{BillingLinks, BillingService, SubscriptionError};
