use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::auth::password;
use crate::error::{BorderpassError, Result};

/// Contact and identification details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// National id (RUT) or passport number.
    #[serde(default)]
    pub national_id: Option<String>,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        password::verify(password, &self.password_hash)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub profile: UserProfile,
}

impl NewUser {
    /// Build a new account, hashing the password. Activity follows the role's default.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        role: Role,
        profile: UserProfile,
    ) -> Result<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(BorderpassError::Validation("username is required".into()));
        }
        if password.len() < 6 {
            return Err(BorderpassError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        if profile.name.trim().is_empty() {
            return Err(BorderpassError::Validation("name is required".into()));
        }

        Ok(Self {
            username,
            password_hash: password::hash(password),
            role,
            is_active: role.starts_active(),
            profile,
        })
    }

    /// Materialize with an assigned id and timestamp.
    pub fn into_user(self, id: i64, now: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: self.role,
            is_active: self.is_active,
            profile: self.profile,
            created_at: now,
        }
    }
}
