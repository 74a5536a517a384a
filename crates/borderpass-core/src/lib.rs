pub mod access;
pub mod auth;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod workflow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use access::{can_access, can_read_process, Action, Role};
pub use auth::{AuthContext, Claims, ClaimsBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BorderpassConfig;
pub use error::{BorderpassError, Result};
pub use workflow::{Decision, Outcome, Stage};
