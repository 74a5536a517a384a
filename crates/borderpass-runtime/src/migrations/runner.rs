//! Migration runner guarded by a Postgres advisory lock.
//!
//! Only one process applies migrations at a time; the rest wait on the lock
//! and then find nothing left to do.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use borderpass_core::error::{BorderpassError, Result};

/// Advisory lock key ("BPASS" in ASCII).
const MIGRATION_LOCK_ID: i64 = 0x4250415353;

/// A single migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique name, e.g. `0001_borderpass`.
    pub name: String,
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Applies built-in migrations that have not run yet.
pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations while holding the advisory lock.
    ///
    /// Returns the names of the migrations applied by this call.
    pub async fn run(&self) -> Result<Vec<String>> {
        self.acquire_lock().await?;

        let result = self.run_pending().await;

        // Always release lock, even on error
        if let Err(e) = self.release_lock().await {
            warn!("Failed to release migration lock: {}", e);
        }

        result
    }

    async fn run_pending(&self) -> Result<Vec<String>> {
        self.ensure_migrations_table().await?;

        let applied = self.get_applied_migrations().await?;
        debug!("Already applied migrations: {:?}", applied);

        let mut newly_applied = Vec::new();
        for migration in super::builtin::get_builtin_migrations() {
            if !applied.contains(&migration.name) {
                self.apply_migration(&migration).await?;
                newly_applied.push(migration.name);
            }
        }
        Ok(newly_applied)
    }

    async fn acquire_lock(&self) -> Result<()> {
        debug!("Acquiring migration lock...");
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                BorderpassError::Database(format!("Failed to acquire migration lock: {}", e))
            })?;
        debug!("Migration lock acquired");
        Ok(())
    }

    async fn release_lock(&self) -> Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                BorderpassError::Database(format!("Failed to release migration lock: {}", e))
            })?;
        debug!("Migration lock released");
        Ok(())
    }

    async fn ensure_migrations_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS borderpass_migrations (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) UNIQUE NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            BorderpassError::Database(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }

    async fn get_applied_migrations(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM borderpass_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                BorderpassError::Database(format!("Failed to get applied migrations: {}", e))
            })?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<()> {
        info!(migration = %migration.name, "Applying migration");

        let mut tx = self.pool.begin().await?;
        for statement in split_sql_statements(&migration.sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    BorderpassError::Database(format!(
                        "Failed to apply migration '{}': {}",
                        migration.name, e
                    ))
                })?;
        }

        sqlx::query("INSERT INTO borderpass_migrations (name) VALUES ($1)")
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                BorderpassError::Database(format!(
                    "Failed to record migration '{}': {}",
                    migration.name, e
                ))
            })?;
        tx.commit().await?;

        info!(migration = %migration.name, "Migration applied");
        Ok(())
    }
}

/// Split SQL into statements on `;`, ignoring semicolons inside single-quoted
/// literals and `--` comments. Comment-only chunks are dropped.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;

    for line in sql.lines() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if !in_literal && c == '-' && chars.peek() == Some(&'-') {
                break;
            }
            if c == '\'' {
                in_literal = !in_literal;
            }
            if c == ';' && !in_literal {
                push_statement(&mut statements, &current);
                current.clear();
                continue;
            }
            current.push(c);
        }
        current.push('\n');
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, chunk: &str) {
    let stmt = chunk.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}
