//! Request middleware

pub mod gate;
pub mod locale;

pub use gate::{request_gate, RouteClass, RoutePolicy};
pub use locale::{Locale, LocaleNegotiator};
