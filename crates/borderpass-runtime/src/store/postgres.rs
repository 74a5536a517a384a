//! PostgreSQL repository.
//!
//! Commits run in one transaction holding `SELECT ... FOR UPDATE` on the
//! process row. Dropping the transaction on an early return rolls it back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use borderpass_core::access::Role;
use borderpass_core::domain::{
    ActivityLogEntry, AgricultureStatus, FinalStatus, FormPayload, IdentityStatus, NewActivity,
    NewNotification, NewProcess, NewUser, Notification, OverallStatus, Process, ProcessKind,
    ProcessUpdate, Review, User, UserProfile,
};
use borderpass_core::{BorderpassError, Clock, Result};

use super::traits::{ActivityLog, NotificationStore, ProcessStore, Repository, UserDirectory};

const PROCESS_COLUMNS: &str = "id, owner_id, kind, payload, overall_status, agriculture_status, \
     agriculture_observations, identity_status, identity_observations, final_status, version, \
     created_at, updated_at";

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, process_id, title, message, severity, is_read, created_at";

const ACTIVITY_COLUMNS: &str = "id, actor_id, process_id, action, details, created_at";

const USER_COLUMNS: &str =
    "id, username, password_hash, role, is_active, name, email, phone, national_id, created_at";

/// Repository over the `borderpass_*` tables.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresRepository {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn insert_process(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new: NewProcess,
    ) -> Result<Process> {
        let now = self.clock.now();
        let payload = new.payload.to_value()?;
        // Placeholder id; the row's id is read back below.
        let draft = Process::submitted(0, new, now);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO borderpass_processes \
             (owner_id, kind, payload, overall_status, agriculture_status, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING id",
        )
        .bind(draft.owner_id)
        .bind(draft.kind.as_str())
        .bind(payload)
        .bind(draft.overall_status.as_str())
        .bind(draft.agriculture_review.status.as_str())
        .bind(draft.version)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Process { id, ..draft })
    }

    async fn store_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        process: &Process,
    ) -> Result<()> {
        let identity = process.identity_review.as_ref();
        sqlx::query(
            "UPDATE borderpass_processes SET overall_status = $2, agriculture_status = $3, \
             agriculture_observations = $4, identity_status = $5, identity_observations = $6, \
             final_status = $7, version = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(process.id)
        .bind(process.overall_status.as_str())
        .bind(process.agriculture_review.status.as_str())
        .bind(process.agriculture_review.observations.as_deref())
        .bind(identity.map(|r| r.status.as_str()))
        .bind(identity.and_then(|r| r.observations.as_deref()))
        .bind(process.final_status.map(|s| s.as_str()))
        .bind(process.version)
        .bind(process.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_activity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: NewActivity,
    ) -> Result<ActivityLogEntry> {
        let now = self.clock.now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO borderpass_activity_log (actor_id, process_id, action, details, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(entry.actor_id)
        .bind(entry.process_id)
        .bind(entry.action.as_str())
        .bind(&entry.details)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(entry.into_entry(id, now))
    }

    async fn insert_notification(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new: NewNotification,
    ) -> Result<Notification> {
        let now = self.clock.now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO borderpass_notifications \
             (user_id, process_id, title, message, severity, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6) RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.process_id)
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.severity.as_str())
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(new.into_notification(id, now))
    }

    async fn insert_user(&self, tx: &mut Transaction<'_, Postgres>, new: NewUser) -> Result<User> {
        let now = self.clock.now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO borderpass_users \
             (username, password_hash, role, is_active, name, email, phone, national_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.is_active)
        .bind(&new.profile.name)
        .bind(new.profile.email.as_deref())
        .bind(new.profile.phone.as_deref())
        .bind(new.profile.national_id.as_deref())
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BorderpassError::Validation(format!(
                    "username '{}' is already taken",
                    new.username
                ))
            } else {
                BorderpassError::Sql(e)
            }
        })?;
        Ok(new.into_user(id, now))
    }

    async fn fetch_processes(&self, filter: &str, bind: Option<&str>) -> Result<Vec<Process>> {
        let sql = format!(
            "SELECT {} FROM borderpass_processes {} ORDER BY id",
            PROCESS_COLUMNS, filter
        );
        let query = sqlx::query(&sql);
        let query = match bind {
            Some(value) => query.bind(value),
            None => query,
        };
        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(process_from_row)
            .collect()
    }
}

fn process_from_row(row: &PgRow) -> Result<Process> {
    let kind: ProcessKind = row.try_get::<String, _>("kind")?.parse()?;
    let payload: serde_json::Value = row.try_get("payload")?;
    let identity_review = match row.try_get::<Option<String>, _>("identity_status")? {
        Some(status) => Some(Review {
            status: status.parse::<IdentityStatus>()?,
            observations: row.try_get("identity_observations")?,
        }),
        None => None,
    };
    let final_status = row
        .try_get::<Option<String>, _>("final_status")?
        .map(|s| s.parse::<FinalStatus>())
        .transpose()?;

    Ok(Process {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        kind,
        payload: FormPayload::from_value(kind, payload)?,
        overall_status: row.try_get::<String, _>("overall_status")?.parse()?,
        agriculture_review: Review {
            status: row
                .try_get::<String, _>("agriculture_status")?
                .parse::<AgricultureStatus>()?,
            observations: row.try_get("agriculture_observations")?,
        },
        identity_review,
        final_status,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        process_id: row.try_get("process_id")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        severity: row.try_get::<String, _>("severity")?.parse()?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn activity_from_row(row: &PgRow) -> Result<ActivityLogEntry> {
    Ok(ActivityLogEntry {
        id: row.try_get("id")?,
        actor_id: row.try_get("actor_id")?,
        process_id: row.try_get("process_id")?,
        action: row.try_get::<String, _>("action")?.parse()?,
        details: row.try_get("details")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get::<String, _>("role")?.parse()?,
        is_active: row.try_get("is_active")?,
        profile: UserProfile {
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            national_id: row.try_get("national_id")?,
        },
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl ProcessStore for PostgresRepository {
    async fn create_process(&self, new: NewProcess) -> Result<Process> {
        let mut tx = self.pool.begin().await?;
        let process = self.insert_process(&mut tx, new).await?;
        tx.commit().await?;
        tracing::debug!(process_id = process.id, "Process created");
        Ok(process)
    }

    async fn get_process(&self, id: i64) -> Result<Process> {
        let sql = format!("SELECT {} FROM borderpass_processes WHERE id = $1", PROCESS_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BorderpassError::NotFound(format!("process {}", id)))?;
        process_from_row(&row)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Process>> {
        let sql = format!(
            "SELECT {} FROM borderpass_processes WHERE owner_id = $1 ORDER BY id",
            PROCESS_COLUMNS
        );
        sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(process_from_row)
            .collect()
    }

    async fn list_for_role(&self, role: Role) -> Result<Vec<Process>> {
        match role {
            Role::Traveler => Ok(Vec::new()),
            Role::AgricultureReviewer => {
                self.fetch_processes(
                    "WHERE overall_status = $1",
                    Some(OverallStatus::AgricultureReview.as_str()),
                )
                .await
            }
            Role::IdentityReviewer => {
                self.fetch_processes(
                    "WHERE overall_status = $1",
                    Some(OverallStatus::IdentityReview.as_str()),
                )
                .await
            }
            Role::Administrator => self.fetch_processes("", None).await,
        }
    }

    async fn update_process(&self, id: i64, update: ProcessUpdate) -> Result<Process> {
        let mut tx = self.pool.begin().await?;
        let mut process = lock_process(&mut tx, id)
            .await?
            .ok_or_else(|| BorderpassError::NotFound(format!("process {}", id)))?;
        update.apply_to(&mut process, self.clock.now())?;
        self.store_update(&mut tx, &process).await?;
        tx.commit().await?;
        Ok(process)
    }
}

async fn lock_process(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<Option<Process>> {
    let sql = format!(
        "SELECT {} FROM borderpass_processes WHERE id = $1 FOR UPDATE",
        PROCESS_COLUMNS
    );
    sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .as_ref()
        .map(process_from_row)
        .transpose()
}

impl NotificationStore for PostgresRepository {
    async fn create_notification(&self, new: NewNotification) -> Result<Notification> {
        let mut tx = self.pool.begin().await?;
        let notification = self.insert_notification(&mut tx, new).await?;
        tx.commit().await?;
        Ok(notification)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM borderpass_notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(notification_from_row)
            .collect()
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE borderpass_notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl ActivityLog for PostgresRepository {
    async fn append(&self, entry: NewActivity) -> Result<ActivityLogEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = self.insert_activity(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn list_by_process(&self, process_id: i64) -> Result<Vec<ActivityLogEntry>> {
        let sql = format!(
            "SELECT {} FROM borderpass_activity_log WHERE process_id = $1 ORDER BY id DESC",
            ACTIVITY_COLUMNS
        );
        sqlx::query(&sql)
            .bind(process_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(activity_from_row)
            .collect()
    }
}

impl UserDirectory for PostgresRepository {
    async fn get_user(&self, id: i64) -> Result<User> {
        let sql = format!("SELECT {} FROM borderpass_users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BorderpassError::NotFound(format!("user {}", id)))?;
        user_from_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM borderpass_users WHERE username = $1", USER_COLUMNS);
        sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let user = self.insert_user(&mut tx, new).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn list_active_by_role(&self, role: Role) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM borderpass_users WHERE role = $1 AND is_active ORDER BY id",
            USER_COLUMNS
        );
        sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<User> {
        let sql = format!(
            "UPDATE borderpass_users SET is_active = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BorderpassError::NotFound(format!("user {}", id)))?;
        user_from_row(&row)
    }

    async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borderpass_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl Repository for PostgresRepository {
    async fn commit_submission(
        &self,
        new: NewProcess,
        mut activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<Process> {
        let mut tx = self.pool.begin().await?;
        let process = self.insert_process(&mut tx, new).await?;

        activity.process_id = Some(process.id);
        self.insert_activity(&mut tx, activity).await?;
        for mut notification in notifications {
            notification.process_id = Some(process.id);
            self.insert_notification(&mut tx, notification).await?;
        }

        tx.commit().await?;
        Ok(process)
    }

    async fn commit_transition(
        &self,
        process_id: i64,
        expected_version: i64,
        update: ProcessUpdate,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<Process> {
        let mut tx = self.pool.begin().await?;
        let Some(mut process) = lock_process(&mut tx, process_id).await? else {
            return Err(BorderpassError::Internal(format!(
                "process {} disappeared before commit",
                process_id
            )));
        };
        if process.version != expected_version {
            return Err(BorderpassError::InvalidTransition(format!(
                "process {} was modified concurrently",
                process_id
            )));
        }

        update.apply_to(&mut process, self.clock.now())?;
        self.store_update(&mut tx, &process).await?;
        self.insert_activity(&mut tx, activity).await?;
        for notification in notifications {
            self.insert_notification(&mut tx, notification).await?;
        }

        tx.commit().await?;
        Ok(process)
    }

    async fn commit_registration(
        &self,
        new: NewUser,
        mut activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let user = self.insert_user(&mut tx, new).await?;

        activity.actor_id = user.id;
        self.insert_activity(&mut tx, activity).await?;
        for notification in notifications {
            self.insert_notification(&mut tx, notification).await?;
        }

        tx.commit().await?;
        tracing::debug!(user_id = user.id, "User registered");
        Ok(user)
    }

    async fn commit_effects(
        &self,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.insert_activity(&mut tx, activity).await?;
        for notification in notifications {
            self.insert_notification(&mut tx, notification).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// These run against a live server: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::MigrationRunner;
    use borderpass_core::domain::{ActivityAction, Severity};
    use borderpass_core::testing::fixtures;
    use borderpass_core::{assert_err_variant, ManualClock};
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    async fn repo() -> PostgresRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .unwrap();
        MigrationRunner::new(pool.clone()).run().await.unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 11, 20, 8, 0, 0).unwrap(),
        ));
        PostgresRepository::new(pool, clock)
    }

    /// Tests share one database, so every account gets a fresh name.
    async fn user(repo: &PostgresRepository, role: Role) -> User {
        let username = format!("pg-{}", uuid::Uuid::new_v4().simple());
        let mut new = NewUser::new(username, "pass123", role, fixtures::profile("Test")).unwrap();
        new.is_active = true;
        repo.create_user(new).await.unwrap()
    }

    fn note(user_id: i64, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            process_id: None,
            title: title.into(),
            message: String::new(),
            severity: Severity::Info,
        }
    }

    fn activity(actor_id: i64, action: ActivityAction) -> NewActivity {
        NewActivity {
            actor_id,
            process_id: None,
            action,
            details: String::new(),
        }
    }

    async fn submitted(repo: &PostgresRepository, owner: &User, reviewer: &User) -> Process {
        repo.commit_submission(
            NewProcess {
                owner_id: owner.id,
                kind: ProcessKind::Declaration,
                payload: fixtures::declaration_form(),
            },
            activity(owner.id, ActivityAction::ProcessCreated),
            vec![note(reviewer.id, "review")],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_commit_submission_links_effects() {
        let repo = repo().await;
        let owner = user(&repo, Role::Traveler).await;
        let agri = user(&repo, Role::AgricultureReviewer).await;
        let process = submitted(&repo, &owner, &agri).await;

        assert_eq!(repo.get_process(process.id).await.unwrap(), process);
        let log = repo.list_by_process(process.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, ActivityAction::ProcessCreated);
        let notes = repo.list_by_user(agri.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].process_id, Some(process.id));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_commit_transition_version_mismatch_applies_nothing() {
        let repo = repo().await;
        let owner = user(&repo, Role::Traveler).await;
        let agri = user(&repo, Role::AgricultureReviewer).await;
        let identity = user(&repo, Role::IdentityReviewer).await;
        let process = submitted(&repo, &owner, &agri).await;
        let before = repo.get_process(process.id).await.unwrap();

        let result = repo
            .commit_transition(
                process.id,
                process.version + 1,
                ProcessUpdate {
                    overall_status: Some(OverallStatus::IdentityReview),
                    ..Default::default()
                },
                activity(agri.id, ActivityAction::AgricultureApproved),
                vec![note(identity.id, "identity")],
            )
            .await;

        assert_err_variant!(result, BorderpassError::InvalidTransition(_));
        assert_eq!(repo.get_process(process.id).await.unwrap(), before);
        assert_eq!(repo.list_by_process(process.id).await.unwrap().len(), 1);
        assert!(repo.list_by_user(identity.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_commit_transition_applies_and_bumps_version() {
        let repo = repo().await;
        let owner = user(&repo, Role::Traveler).await;
        let agri = user(&repo, Role::AgricultureReviewer).await;
        let identity = user(&repo, Role::IdentityReviewer).await;
        let process = submitted(&repo, &owner, &agri).await;

        let mut entry = activity(agri.id, ActivityAction::AgricultureApproved);
        entry.process_id = Some(process.id);
        let updated = repo
            .commit_transition(
                process.id,
                process.version,
                ProcessUpdate {
                    overall_status: Some(OverallStatus::IdentityReview),
                    agriculture_review: Some(Review::new(AgricultureStatus::Approved)),
                    identity_review: Some(Review::new(IdentityStatus::Pending)),
                    ..Default::default()
                },
                entry,
                vec![note(identity.id, "identity")],
            )
            .await
            .unwrap();

        assert_eq!(updated.version, process.version + 1);
        assert_eq!(repo.get_process(process.id).await.unwrap(), updated);
        assert_eq!(repo.list_by_process(process.id).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_user(identity.id).await.unwrap().len(), 1);

        // The version the caller planned against is now stale.
        let stale = repo
            .commit_transition(
                process.id,
                process.version,
                ProcessUpdate::default(),
                activity(agri.id, ActivityAction::AgricultureApproved),
                Vec::new(),
            )
            .await;
        assert_err_variant!(stale, BorderpassError::InvalidTransition(_));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_commit_transition_missing_process_is_internal() {
        let repo = repo().await;
        let result = repo
            .commit_transition(
                i64::MAX,
                0,
                ProcessUpdate::default(),
                activity(1, ActivityAction::AgricultureApproved),
                Vec::new(),
            )
            .await;
        assert_err_variant!(result, BorderpassError::Internal(_));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_commit_registration_duplicate_writes_nothing() {
        let repo = repo().await;
        let admin = user(&repo, Role::Administrator).await;
        let username = format!("pg-{}", uuid::Uuid::new_v4().simple());
        let new = || {
            NewUser::new(username.as_str(), "pass123", Role::Traveler, fixtures::profile("Juan"))
                .unwrap()
        };

        let registered = repo
            .commit_registration(
                new(),
                activity(0, ActivityAction::UserRegistered),
                vec![note(admin.id, "registration")],
            )
            .await
            .unwrap();
        assert!(!registered.is_active);
        assert_eq!(repo.list_by_user(admin.id).await.unwrap().len(), 1);

        let duplicate = repo
            .commit_registration(
                new(),
                activity(0, ActivityAction::UserRegistered),
                vec![note(admin.id, "registration")],
            )
            .await;
        assert_err_variant!(duplicate, BorderpassError::Validation(_));
        assert_eq!(repo.list_by_user(admin.id).await.unwrap().len(), 1);
        assert_eq!(
            repo.find_by_username(&username).await.unwrap().map(|u| u.id),
            Some(registered.id)
        );
    }
}
