use serde::{Deserialize, Serialize};

use crate::access::Role;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Role the session was issued for.
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Get the numeric user ID.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }

    /// Create a builder for constructing claims.
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }
}

/// Builder for JWT claims.
#[derive(Debug)]
pub struct ClaimsBuilder {
    sub: Option<String>,
    role: Option<Role>,
    duration_secs: i64,
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            sub: None,
            role: None,
            duration_secs: 3600, // 1 hour default
        }
    }

    /// Set the user ID.
    pub fn user_id(mut self, id: i64) -> Self {
        self.sub = Some(id.to_string());
        self
    }

    /// Set the role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set token duration in seconds.
    pub fn duration_secs(mut self, secs: i64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Build the claims.
    pub fn build(self) -> Result<Claims, String> {
        let sub = self.sub.ok_or("Subject is required")?;
        let role = self.role.ok_or("Role is required")?;
        let now = chrono::Utc::now().timestamp();

        Ok(Claims {
            sub,
            role,
            iat: now,
            exp: now + self.duration_secs,
        })
    }
}
