//! Data models for users, forms, and sessions.

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
