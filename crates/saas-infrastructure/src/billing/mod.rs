//! Billing provider adapter (Stripe)

mod wire;
pub mod stripe;
pub mod webhook;

pub use stripe::StripeClient;
pub use webhook::{WebhookError, WebhookEvent, WebhookVerifier};
