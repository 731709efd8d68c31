//! # SaaS API
//!
//! HTTP surface: request gate, locale negotiation, form actions and handlers.

pub mod actions;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
