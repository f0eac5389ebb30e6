//! Dashboard user administration.
//!
//! Users are kept in their own repository. Passwords are never stored
//! here; they belong to the authentication provider.

use crate::error::{Result, StoreError};
use crate::models::{RecordId, User};
use crate::store::Repository;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shortest password accepted on reset.
pub const MIN_PASSWORD_LEN: usize = 8;

/// One-time credentials handed to a newly invited user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub email: String,
    pub temporary_password: String,
    pub login_url: String,
    pub must_change_password: bool,
}

/// Administrative actions on dashboard users.
#[derive(Clone)]
pub struct UserAdmin {
    users: Arc<dyn Repository<User>>,
}

impl UserAdmin {
    pub fn new(users: Arc<dyn Repository<User>>) -> Self {
        Self { users }
    }

    /// Check a password reset for an existing user.
    pub async fn reset_password(&self, id: RecordId, password: &str) -> Result<bool> {
        let user = self.users.get_by_id(id).await?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        info!("Password reset accepted for {}", user.email);
        Ok(true)
    }

    /// Issue a temporary password and the login URL for `email`.
    pub fn generate_login_credentials(&self, email: &str, base_url: &str) -> Result<LoginCredentials> {
        let email = email.trim();
        if email.is_empty() {
            return Err(StoreError::Validation(
                "an email address is required to issue credentials".to_string(),
            ));
        }

        Ok(LoginCredentials {
            email: email.to_string(),
            temporary_password: temporary_password(),
            login_url: format!("{}/login", base_url.trim_end_matches('/')),
            must_change_password: true,
        })
    }
}

/// Eight lowercase then eight uppercase alphanumerics.
fn temporary_password() -> String {
    let random = Uuid::new_v4().simple().to_string();
    let (lower, rest) = random.split_at(8);
    format!("{}{}", lower, rest[..8].to_uppercase())
}
