//! Users and the registration/login forms.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A registered user as held by the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// PHC-format password hash; never leaves the server.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// POST /submitUser body.
#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 20),
        custom(function = "validate_alphanumeric")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 20))]
    pub password: String,
}

/// POST /loggingin body. Only the username is shape-checked.
#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 20),
        custom(function = "validate_alphanumeric")
    )]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// ASCII letters and digits only.
pub fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("alphanumeric"))
    }
}
