mod claims;
mod context;
pub mod password;

pub use claims::{Claims, ClaimsBuilder};
pub use context::AuthContext;
