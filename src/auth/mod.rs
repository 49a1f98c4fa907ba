//! Authentication: credential forms, password hashing, signed session tokens.

mod handlers;
mod password;
mod token;

pub use handlers::*;
pub use password::PasswordHasher;
pub use token::TokenSigner;
