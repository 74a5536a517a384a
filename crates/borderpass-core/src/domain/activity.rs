use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BorderpassError;

/// What an activity-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    ProcessCreated,
    AgricultureApproved,
    AgricultureRejected,
    IdentityApproved,
    IdentityObserved,
    IdentityRejected,
    UserRegistered,
    UserActivated,
}

impl ActivityAction {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessCreated => "PROCESS_CREATED",
            Self::AgricultureApproved => "AGRICULTURE_APPROVED",
            Self::AgricultureRejected => "AGRICULTURE_REJECTED",
            Self::IdentityApproved => "IDENTITY_APPROVED",
            Self::IdentityObserved => "IDENTITY_OBSERVED",
            Self::IdentityRejected => "IDENTITY_REJECTED",
            Self::UserRegistered => "USER_REGISTERED",
            Self::UserActivated => "USER_ACTIVATED",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESS_CREATED" => Ok(Self::ProcessCreated),
            "AGRICULTURE_APPROVED" => Ok(Self::AgricultureApproved),
            "AGRICULTURE_REJECTED" => Ok(Self::AgricultureRejected),
            "IDENTITY_APPROVED" => Ok(Self::IdentityApproved),
            "IDENTITY_OBSERVED" => Ok(Self::IdentityObserved),
            "IDENTITY_REJECTED" => Ok(Self::IdentityRejected),
            "USER_REGISTERED" => Ok(Self::UserRegistered),
            "USER_ACTIVATED" => Ok(Self::UserActivated),
            other => Err(BorderpassError::Validation(format!(
                "unknown activity action '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub actor_id: i64,
    pub process_id: Option<i64>,
    pub action: ActivityAction,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Input for appending an activity-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub actor_id: i64,
    pub process_id: Option<i64>,
    pub action: ActivityAction,
    pub details: String,
}

impl NewActivity {
    /// Materialize with an assigned id and timestamp.
    pub fn into_entry(self, id: i64, now: DateTime<Utc>) -> ActivityLogEntry {
        ActivityLogEntry {
            id,
            actor_id: self.actor_id,
            process_id: self.process_id,
            action: self.action,
            details: self.details,
            created_at: now,
        }
    }
}
