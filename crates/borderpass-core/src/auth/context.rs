use crate::access::Role;
use crate::error::{BorderpassError, Result};

use super::Claims;

/// Authentication context attached to each request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user_id: Option<i64>,
    role: Option<Role>,
}

impl AuthContext {
    /// Create an unauthenticated context.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Create an authenticated context.
    pub fn authenticated(user_id: i64, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            role: Some(role),
        }
    }

    /// Build from validated token claims.
    pub fn from_claims(claims: &Claims) -> Result<Self> {
        let user_id = claims
            .user_id()
            .ok_or_else(|| BorderpassError::Unauthorized("Invalid subject claim".into()))?;
        Ok(Self::authenticated(user_id, claims.role))
    }

    /// Check if the user is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Get the user ID if authenticated.
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// Get the claimed role if authenticated.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Get the caller's id and role, returning an error if not authenticated.
    pub fn require_user(&self) -> Result<(i64, Role)> {
        match (self.user_id, self.role) {
            (Some(id), Some(role)) => Ok((id, role)),
            _ => Err(BorderpassError::Unauthorized(
                "Authentication required".into(),
            )),
        }
    }
}
