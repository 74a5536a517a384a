//! Workflow engine: the only writer of process state.

mod locks;
mod service;

pub use locks::{ProcessGuard, ProcessLocks};
pub use service::WorkflowEngine;
