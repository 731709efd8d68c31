//! Application-wide constants

pub const SESSION_COOKIE_NAME: &str = "session";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
pub const MIN_SECRET_LENGTH: usize = 32;
pub const DEFAULT_TRIAL_PERIOD_DAYS: u32 = 14;
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;
pub const BILLING_PROVIDER_STRIPE: &str = "stripe";
pub const MAX_SUBDOMAIN_ATTEMPTS: u32 = 10;
