use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payload::FormPayload;
use crate::error::{BorderpassError, Result};

/// Kind of border-crossing paperwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// Authorization for a minor travelling with a guardian.
    MinorTravel,
    /// Temporary admission of a vehicle.
    VehicleAdmission,
    /// Sworn customs declaration of food, plants and animals.
    Declaration,
}

impl ProcessKind {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinorTravel => "minor_travel",
            Self::VehicleAdmission => "vehicle_admission",
            Self::Declaration => "declaration",
        }
    }

    /// Human-readable label used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MinorTravel => "minor travel authorization",
            Self::VehicleAdmission => "vehicle temporary admission",
            Self::Declaration => "customs declaration",
        }
    }
}

impl FromStr for ProcessKind {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minor_travel" => Ok(Self::MinorTravel),
            "vehicle_admission" => Ok(Self::VehicleAdmission),
            "declaration" => Ok(Self::Declaration),
            other => Err(BorderpassError::Validation(format!(
                "unknown process kind '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall position of a process in the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Received but not yet queued for review.
    Submitted,
    /// Waiting for the agriculture authority.
    AgricultureReview,
    /// Waiting for the identity authority.
    IdentityReview,
    /// Both authorities approved.
    Approved,
    /// Either authority rejected.
    Rejected,
}

impl OverallStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::AgricultureReview => "agriculture_review",
            Self::IdentityReview => "identity_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Check if no further decisions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl FromStr for OverallStatus {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "agriculture_review" => Ok(Self::AgricultureReview),
            "identity_review" => Ok(Self::IdentityReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(BorderpassError::Validation(format!(
                "unknown process status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agriculture review outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgricultureStatus {
    Pending,
    Approved,
    Rejected,
}

impl AgricultureStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for AgricultureStatus {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(BorderpassError::Validation(format!(
                "unknown agriculture status '{}'",
                other
            ))),
        }
    }
}

/// Identity review outcome. `Observed` asks the traveler for clarification
/// without ending the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    Pending,
    Approved,
    Rejected,
    Observed,
}

impl IdentityStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Observed => "observed",
        }
    }
}

impl FromStr for IdentityStatus {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "observed" => Ok(Self::Observed),
            other => Err(BorderpassError::Validation(format!(
                "unknown identity status '{}'",
                other
            ))),
        }
    }
}

/// Final administrative outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Approved,
    Rejected,
}

impl FinalStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for FinalStatus {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(BorderpassError::Validation(format!(
                "unknown final status '{}'",
                other
            ))),
        }
    }
}

/// One reviewing authority's verdict on a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review<S> {
    pub status: S,
    pub observations: Option<String>,
}

impl<S> Review<S> {
    /// A review with no observations.
    pub fn new(status: S) -> Self {
        Self {
            status,
            observations: None,
        }
    }

    /// A review carrying reviewer observations.
    pub fn with_observations(status: S, observations: impl Into<String>) -> Self {
        Self {
            status,
            observations: Some(observations.into()),
        }
    }
}

pub type AgricultureReview = Review<AgricultureStatus>;
pub type IdentityReview = Review<IdentityStatus>;

/// A traveler's submitted border-crossing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Process {
    pub id: i64,
    pub owner_id: i64,
    pub kind: ProcessKind,
    pub payload: FormPayload,
    pub overall_status: OverallStatus,
    pub agriculture_review: AgricultureReview,
    /// `None` until the agriculture authority approves.
    pub identity_review: Option<IdentityReview>,
    pub final_status: Option<FinalStatus>,
    /// Incremented on every mutation.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Process {
    /// Build the initial record for a fresh submission.
    ///
    /// The process enters agriculture review immediately.
    pub fn submitted(id: i64, new: NewProcess, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            kind: new.kind,
            payload: new.payload,
            overall_status: OverallStatus::AgricultureReview,
            agriculture_review: Review::new(AgricultureStatus::Pending),
            identity_review: None,
            final_status: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity review status, treating "not yet started" as pending.
    pub fn identity_status(&self) -> IdentityStatus {
        self.identity_review
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(IdentityStatus::Pending)
    }
}

/// Input for creating a process.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProcess {
    pub owner_id: i64,
    pub kind: ProcessKind,
    pub payload: FormPayload,
}

impl NewProcess {
    /// Validate that the payload matches the kind and its own field rules.
    pub fn validate(&self) -> Result<()> {
        if self.payload.kind() != self.kind {
            return Err(BorderpassError::Validation(format!(
                "payload is a {} form but the process kind is {}",
                self.payload.kind(),
                self.kind
            )));
        }
        self.payload.validate()
    }
}

/// Reviewer-facing fields a store update may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessUpdate {
    pub overall_status: Option<OverallStatus>,
    pub agriculture_review: Option<AgricultureReview>,
    pub identity_review: Option<IdentityReview>,
    pub final_status: Option<FinalStatus>,
}

impl ProcessUpdate {
    /// Apply this update, bumping the version and `updated_at`.
    ///
    /// A final status, once set, can never be changed.
    pub fn apply_to(&self, process: &mut Process, now: DateTime<Utc>) -> Result<()> {
        if let (Some(current), Some(next)) = (process.final_status, self.final_status) {
            if current != next {
                return Err(BorderpassError::InvalidTransition(format!(
                    "process {} is already final ({})",
                    process.id,
                    current.as_str()
                )));
            }
        }

        if let Some(status) = self.overall_status {
            process.overall_status = status;
        }
        if let Some(review) = &self.agriculture_review {
            process.agriculture_review = review.clone();
        }
        if let Some(review) = &self.identity_review {
            process.identity_review = Some(review.clone());
        }
        if let Some(status) = self.final_status {
            process.final_status = Some(status);
        }
        process.version += 1;
        process.updated_at = now;
        Ok(())
    }
}
