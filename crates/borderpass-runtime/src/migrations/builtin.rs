//! Built-in BorderPass schema migrations.
//!
//! Applied once each, tracked in `borderpass_migrations`.

use super::runner::Migration;

const BORDERPASS_SCHEMA_SQL: &str = include_str!("../../migrations/0001_borderpass.sql");

/// Get all built-in migrations, in application order.
pub fn get_builtin_migrations() -> Vec<Migration> {
    vec![Migration::new("0001_borderpass", BORDERPASS_SCHEMA_SQL)]
}
