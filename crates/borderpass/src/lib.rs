//! BorderPass: border-crossing paperwork with a two-stage review workflow.
//!
//! Travelers submit forms, the agriculture authority and then the identity
//! authority review them, and everyone involved is notified along the way.

mod runtime;

pub use borderpass_core;
pub use borderpass_runtime;

#[cfg(feature = "testing")]
pub use borderpass_core::{assert_err, assert_err_variant, assert_ok};

pub use runtime::{Borderpass, BorderpassBuilder};
