//! # SaaS Security
//! 
//! Security utilities: session token codec, password hashing, session cookies.

pub mod token;
pub mod password;
pub mod session;

pub use password::PasswordService;
pub use session::{SessionCookie, SessionManager, SessionPayload};
pub use token::{TokenCodec, TokenError};
