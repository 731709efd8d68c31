//! # SaaS Shared
//! 
//! Shared configuration, constants, utilities and telemetry for the SaaS application.

pub mod constants;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::AppError;
