use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BorderpassError;

/// Display tag for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl FromStr for Severity {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(BorderpassError::Validation(format!(
                "unknown severity '{}'",
                other
            ))),
        }
    }
}

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    /// Recipient.
    pub user_id: i64,
    pub process_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub process_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl NewNotification {
    /// Materialize with an assigned id and timestamp, unread.
    pub fn into_notification(self, id: i64, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            process_id: self.process_id,
            title: self.title,
            message: self.message,
            severity: self.severity,
            is_read: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_notification_is_unread() {
        let now = Utc::now();
        let n = NewNotification {
            user_id: 7,
            process_id: Some(3),
            title: "Process approved".into(),
            message: "ok".into(),
            severity: Severity::Success,
        }
        .into_notification(11, now);

        assert_eq!(n.id, 11);
        assert_eq!(n.user_id, 7);
        assert!(!n.is_read);
        assert_eq!(n.created_at, now);
    }

    #[test]
    fn test_severity_conversion() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(Severity::Error.as_str(), "error");
        assert!("urgent".parse::<Severity>().is_err());
    }
}
