mod policy;
mod role;

pub use policy::{can_access, can_read_process, Action};
pub use role::Role;
