use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::access::{can_access, Action, Role};
use crate::error::{BorderpassError, Result};

/// A review stage, owned by exactly one reviewer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Agriculture,
    Identity,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agriculture => "agriculture",
            Self::Identity => "identity",
        }
    }

    /// The permission needed to decide this stage.
    pub fn action(&self) -> Action {
        match self {
            Self::Agriculture => Action::ReviewAgriculture,
            Self::Identity => Action::ReviewIdentity,
        }
    }

    /// The roles allowed to decide this stage, per the permission table.
    pub fn reviewers(&self) -> Vec<Role> {
        Role::all()
            .into_iter()
            .filter(|role| can_access(*role, self.action()))
            .collect()
    }
}

impl FromStr for Stage {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "agriculture" => Ok(Self::Agriculture),
            "identity" => Ok(Self::Identity),
            other => Err(BorderpassError::Validation(format!(
                "unknown review stage '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a reviewer decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approve,
    Reject,
    /// Ask the traveler for clarification without closing the stage.
    Observe,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Observe => "observe",
        }
    }

    /// Whether the reviewer must explain this outcome.
    pub fn requires_observation(&self) -> bool {
        matches!(self, Self::Reject | Self::Observe)
    }
}

impl FromStr for Outcome {
    type Err = BorderpassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "observe" => Ok(Self::Observe),
            other => Err(BorderpassError::Validation(format!(
                "unknown review outcome '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reviewer's decision on one stage of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub stage: Stage,
    pub outcome: Outcome,
    #[serde(default)]
    pub observation: Option<String>,
}

impl Decision {
    pub fn new(stage: Stage, outcome: Outcome) -> Self {
        Self {
            stage,
            outcome,
            observation: None,
        }
    }

    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    /// The observation, trimmed, if it has any content.
    pub fn observation_text(&self) -> Option<&str> {
        self.observation
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
