//! Testing utilities for BorderPass crates.
//!
//! Enabled with the `testing` feature. Provides assertion macros for
//! `Result<_, BorderpassError>` and valid form fixtures.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
