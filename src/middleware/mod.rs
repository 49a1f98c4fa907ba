//! Request extractors that resolve the session cookie.

pub mod session;

pub use session::{AuthenticatedUser, CurrentSession};
