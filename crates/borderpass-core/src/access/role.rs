use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BorderpassError;

/// Role held by a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits forms and follows their own processes.
    Traveler,
    /// Sanitary/phytosanitary inspection authority.
    AgricultureReviewer,
    /// Identity and document verification authority.
    IdentityReviewer,
    /// Customs administration.
    Administrator,
}

impl Role {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traveler => "traveler",
            Self::AgricultureReviewer => "agriculture_reviewer",
            Self::IdentityReviewer => "identity_reviewer",
            Self::Administrator => "administrator",
        }
    }

    /// Get all roles.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Traveler,
            Self::AgricultureReviewer,
            Self::IdentityReviewer,
            Self::Administrator,
        ]
    }

    /// Whether a freshly created account with this role starts active.
    ///
    /// Travelers register themselves and wait for an administrator.
    pub fn starts_active(&self) -> bool {
        !matches!(self, Self::Traveler)
    }
}

impl FromStr for Role {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traveler" => Ok(Self::Traveler),
            "agriculture_reviewer" => Ok(Self::AgricultureReviewer),
            "identity_reviewer" => Ok(Self::IdentityReviewer),
            "administrator" => Ok(Self::Administrator),
            other => Err(BorderpassError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
