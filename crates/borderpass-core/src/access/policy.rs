//! Fixed role-to-action permission table.

use serde::{Deserialize, Serialize};

use super::Role;
use crate::domain::{AgricultureStatus, Process};

/// Something a caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ReadOwnProcesses,
    SubmitForm,
    ReviewAgriculture,
    ReviewIdentity,
    ReadAllProcesses,
    ViewReports,
    ActivateUsers,
}

impl Action {
    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ReadOwnProcesses,
            Self::SubmitForm,
            Self::ReviewAgriculture,
            Self::ReviewIdentity,
            Self::ReadAllProcesses,
            Self::ViewReports,
            Self::ActivateUsers,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOwnProcesses => "read_own_processes",
            Self::SubmitForm => "submit_form",
            Self::ReviewAgriculture => "review_agriculture",
            Self::ReviewIdentity => "review_identity",
            Self::ReadAllProcesses => "read_all_processes",
            Self::ViewReports => "view_reports",
            Self::ActivateUsers => "activate_users",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether `role` may perform `action`.
pub fn can_access(role: Role, action: Action) -> bool {
    use Action::*;
    match role {
        Role::Traveler => matches!(action, ReadOwnProcesses | SubmitForm),
        Role::AgricultureReviewer => matches!(action, ReviewAgriculture),
        Role::IdentityReviewer => matches!(action, ReviewIdentity),
        Role::Administrator => matches!(action, ReadAllProcesses | ViewReports | ActivateUsers),
    }
}

/// Whether a caller may read a process and its activity.
///
/// Identity reviewers only see processes that have cleared agriculture.
pub fn can_read_process(role: Role, caller_id: i64, process: &Process) -> bool {
    match role {
        Role::Traveler => process.owner_id == caller_id,
        Role::AgricultureReviewer => true,
        Role::IdentityReviewer => process.agriculture_review.status == AgricultureStatus::Approved,
        Role::Administrator => true,
    }
}
