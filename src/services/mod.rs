//! Business logic: registration, login, and the session lifecycle.

pub mod auth;
pub mod session;

pub use auth::AuthService;
pub use session::{SessionService, SessionSettings};
