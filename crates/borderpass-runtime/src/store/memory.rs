//! Process-local repository.
//!
//! Every table lives behind a single lock, so each commit is atomic with
//! respect to every other operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use borderpass_core::access::Role;
use borderpass_core::domain::{
    ActivityLogEntry, NewActivity, NewNotification, NewProcess, NewUser, Notification,
    OverallStatus, Process, ProcessUpdate, User,
};
use borderpass_core::{BorderpassError, Clock, Result};

use super::traits::{ActivityLog, NotificationStore, ProcessStore, Repository, UserDirectory};

/// Full copy of every table, for before/after comparisons in tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySnapshot {
    pub processes: BTreeMap<i64, Process>,
    pub notifications: BTreeMap<i64, Notification>,
    pub activity: Vec<ActivityLogEntry>,
    pub users: BTreeMap<i64, User>,
}

#[derive(Debug, Default)]
struct Tables {
    data: MemorySnapshot,
    last_process_id: i64,
    last_notification_id: i64,
    last_activity_id: i64,
    last_user_id: i64,
}

impl Tables {
    fn insert_new_user(&mut self, new: NewUser, clock: &dyn Clock) -> Result<User> {
        if self.data.users.values().any(|u| u.username == new.username) {
            return Err(BorderpassError::Validation(format!(
                "username '{}' is already taken",
                new.username
            )));
        }
        self.last_user_id += 1;
        let user = new.into_user(self.last_user_id, clock.now());
        self.data.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_activity(&mut self, entry: NewActivity, clock: &dyn Clock) -> ActivityLogEntry {
        self.last_activity_id += 1;
        let entry = entry.into_entry(self.last_activity_id, clock.now());
        self.data.activity.push(entry.clone());
        entry
    }

    fn insert_notification(&mut self, new: NewNotification, clock: &dyn Clock) -> Notification {
        self.last_notification_id += 1;
        let notification = new.into_notification(self.last_notification_id, clock.now());
        self.data
            .notifications
            .insert(notification.id, notification.clone());
        notification
    }
}

/// In-memory repository backed by ordered maps.
#[derive(Clone)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock,
        }
    }

    /// Insert a user with a caller-chosen id.
    ///
    /// Later ids continue past the largest id seen.
    pub async fn insert_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.data.users.contains_key(&user.id) {
            return Err(BorderpassError::Validation(format!(
                "user id {} already exists",
                user.id
            )));
        }
        tables.last_user_id = tables.last_user_id.max(user.id);
        tables.data.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Copy of every table.
    pub async fn snapshot(&self) -> MemorySnapshot {
        self.tables.read().await.data.clone()
    }
}

impl ProcessStore for MemoryRepository {
    async fn create_process(&self, new: NewProcess) -> Result<Process> {
        let mut tables = self.tables.write().await;
        tables.last_process_id += 1;
        let process = Process::submitted(tables.last_process_id, new, self.clock.now());
        tables.data.processes.insert(process.id, process.clone());
        tracing::debug!(process_id = process.id, "Process created");
        Ok(process)
    }

    async fn get_process(&self, id: i64) -> Result<Process> {
        self.tables
            .read()
            .await
            .data
            .processes
            .get(&id)
            .cloned()
            .ok_or_else(|| BorderpassError::NotFound(format!("process {}", id)))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Process>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .processes
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_for_role(&self, role: Role) -> Result<Vec<Process>> {
        let waiting_on = match role {
            Role::Traveler => return Ok(Vec::new()),
            Role::AgricultureReviewer => Some(OverallStatus::AgricultureReview),
            Role::IdentityReviewer => Some(OverallStatus::IdentityReview),
            Role::Administrator => None,
        };
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .processes
            .values()
            .filter(|p| waiting_on.map_or(true, |status| p.overall_status == status))
            .cloned()
            .collect())
    }

    async fn update_process(&self, id: i64, update: ProcessUpdate) -> Result<Process> {
        let mut tables = self.tables.write().await;
        let process = tables
            .data
            .processes
            .get_mut(&id)
            .ok_or_else(|| BorderpassError::NotFound(format!("process {}", id)))?;
        update.apply_to(process, self.clock.now())?;
        Ok(process.clone())
    }
}

impl NotificationStore for MemoryRepository {
    async fn create_notification(&self, new: NewNotification) -> Result<Notification> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_notification(new, self.clock.as_ref()))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .data
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(notification) = tables.data.notifications.get_mut(&id) {
            notification.is_read = true;
        }
        Ok(())
    }
}

impl ActivityLog for MemoryRepository {
    async fn append(&self, entry: NewActivity) -> Result<ActivityLogEntry> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_activity(entry, self.clock.as_ref()))
    }

    async fn list_by_process(&self, process_id: i64) -> Result<Vec<ActivityLogEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .activity
            .iter()
            .rev()
            .filter(|e| e.process_id == Some(process_id))
            .cloned()
            .collect())
    }
}

impl UserDirectory for MemoryRepository {
    async fn get_user(&self, id: i64) -> Result<User> {
        self.tables
            .read()
            .await
            .data
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| BorderpassError::NotFound(format!("user {}", id)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        tables.insert_new_user(new, self.clock.as_ref())
    }

    async fn list_active_by_role(&self, role: Role) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .users
            .values()
            .filter(|u| u.role == role && u.is_active)
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .data
            .users
            .get_mut(&id)
            .ok_or_else(|| BorderpassError::NotFound(format!("user {}", id)))?;
        user.is_active = active;
        Ok(user.clone())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.tables.read().await.data.users.len() as i64)
    }
}

impl Repository for MemoryRepository {
    async fn commit_submission(
        &self,
        new: NewProcess,
        mut activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<Process> {
        let mut tables = self.tables.write().await;
        tables.last_process_id += 1;
        let process = Process::submitted(tables.last_process_id, new, self.clock.now());
        tables.data.processes.insert(process.id, process.clone());

        activity.process_id = Some(process.id);
        tables.insert_activity(activity, self.clock.as_ref());
        for mut notification in notifications {
            notification.process_id = Some(process.id);
            tables.insert_notification(notification, self.clock.as_ref());
        }
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
        let mut tables = self.tables.write().await;
        let Some(current) = tables.data.processes.get(&process_id) else {
            return Err(BorderpassError::Internal(format!(
                "process {} disappeared before commit",
                process_id
            )));
        };
        if current.version != expected_version {
            return Err(BorderpassError::InvalidTransition(format!(
                "process {} was modified concurrently",
                process_id
            )));
        }

        // Apply to a copy so a rejected update leaves the table untouched.
        let mut next = current.clone();
        update.apply_to(&mut next, self.clock.now())?;
        tables.data.processes.insert(process_id, next.clone());

        tables.insert_activity(activity, self.clock.as_ref());
        for notification in notifications {
            tables.insert_notification(notification, self.clock.as_ref());
        }
        Ok(next)
    }

    async fn commit_registration(
        &self,
        new: NewUser,
        mut activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<User> {
        let mut tables = self.tables.write().await;
        let user = tables.insert_new_user(new, self.clock.as_ref())?;

        activity.actor_id = user.id;
        tables.insert_activity(activity, self.clock.as_ref());
        for notification in notifications {
            tables.insert_notification(notification, self.clock.as_ref());
        }
        Ok(user)
    }

    async fn commit_effects(
        &self,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.insert_activity(activity, self.clock.as_ref());
        for notification in notifications {
            tables.insert_notification(notification, self.clock.as_ref());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use borderpass_core::domain::{
        ActivityAction, AgricultureStatus, FinalStatus, ProcessKind, Review, Severity,
    };
    use borderpass_core::testing::fixtures;
    use borderpass_core::{assert_err_variant, ManualClock};
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 11, 20, 8, 0, 0).unwrap(),
        ))
    }

    fn declaration(owner_id: i64) -> NewProcess {
        NewProcess {
            owner_id,
            kind: ProcessKind::Declaration,
            payload: fixtures::declaration_form(),
        }
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

    fn activity(action: ActivityAction) -> NewActivity {
        NewActivity {
            actor_id: 1,
            process_id: None,
            action,
            details: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_process() {
        let repo = MemoryRepository::new(clock());
        let created = repo.create_process(declaration(42)).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = repo.get_process(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_err_variant!(repo.get_process(99).await, BorderpassError::NotFound(_));
    }

    #[tokio::test]
    async fn test_list_for_role() {
        let repo = MemoryRepository::new(clock());
        let first = repo.create_process(declaration(42)).await.unwrap();
        let second = repo.create_process(declaration(43)).await.unwrap();
        repo.update_process(
            second.id,
            ProcessUpdate {
                overall_status: Some(OverallStatus::IdentityReview),
                agriculture_review: Some(Review::new(AgricultureStatus::Approved)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let agri = repo.list_for_role(Role::AgricultureReviewer).await.unwrap();
        assert_eq!(agri.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id]);

        let identity = repo.list_for_role(Role::IdentityReviewer).await.unwrap();
        assert_eq!(identity.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id]);

        assert_eq!(repo.list_for_role(Role::Administrator).await.unwrap().len(), 2);
        assert!(repo.list_for_role(Role::Traveler).await.unwrap().is_empty());
        assert_eq!(repo.list_by_owner(43).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let clock = clock();
        let repo = MemoryRepository::new(clock.clone());
        let created = repo.create_process(declaration(42)).await.unwrap();

        clock.advance(chrono::Duration::minutes(3));
        let updated = repo
            .update_process(
                created.id,
                ProcessUpdate {
                    final_status: Some(FinalStatus::Rejected),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.version, 1);
        assert_eq!(updated.updated_at, created.updated_at + chrono::Duration::minutes(3));
        assert_err_variant!(
            repo.update_process(99, ProcessUpdate::default()).await,
            BorderpassError::NotFound(_)
        );
    }

    #[tokio::test]
    async fn test_notifications_newest_first() {
        let clock = clock();
        let repo = MemoryRepository::new(clock.clone());
        repo.create_notification(note(5, "first")).await.unwrap();
        clock.advance(chrono::Duration::seconds(1));
        repo.create_notification(note(5, "second")).await.unwrap();
        repo.create_notification(note(5, "third")).await.unwrap();
        repo.create_notification(note(6, "other")).await.unwrap();

        let titles: Vec<_> = repo
            .list_by_user(5)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id_is_noop() {
        let repo = MemoryRepository::new(clock());
        let created = repo.create_notification(note(5, "hello")).await.unwrap();
        assert!(!created.is_read);

        let before = repo.snapshot().await;
        repo.mark_read(12345).await.unwrap();
        assert_eq!(repo.snapshot().await, before);

        repo.mark_read(created.id).await.unwrap();
        repo.mark_read(created.id).await.unwrap();
        assert!(repo.list_by_user(5).await.unwrap()[0].is_read);
    }

    #[tokio::test]
    async fn test_commit_submission_links_effects() {
        let repo = MemoryRepository::new(clock());
        let process = repo
            .commit_submission(
                declaration(42),
                activity(ActivityAction::ProcessCreated),
                vec![note(2, "review")],
            )
            .await
            .unwrap();

        let log = repo.list_by_process(process.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, ActivityAction::ProcessCreated);

        let notes = repo.list_by_user(2).await.unwrap();
        assert_eq!(notes[0].process_id, Some(process.id));
    }

    #[tokio::test]
    async fn test_commit_transition_version_mismatch_applies_nothing() {
        let repo = MemoryRepository::new(clock());
        let process = repo.create_process(declaration(42)).await.unwrap();
        let before = repo.snapshot().await;

        let result = repo
            .commit_transition(
                process.id,
                process.version + 1,
                ProcessUpdate {
                    overall_status: Some(OverallStatus::IdentityReview),
                    ..Default::default()
                },
                activity(ActivityAction::AgricultureApproved),
                vec![note(3, "identity")],
            )
            .await;

        assert_err_variant!(result, BorderpassError::InvalidTransition(_));
        assert_eq!(repo.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_commit_transition_missing_process_is_internal() {
        let repo = MemoryRepository::new(clock());
        let result = repo
            .commit_transition(
                7,
                0,
                ProcessUpdate::default(),
                activity(ActivityAction::AgricultureApproved),
                Vec::new(),
            )
            .await;
        assert_err_variant!(result, BorderpassError::Internal(_));
    }

    #[tokio::test]
    async fn test_commit_registration_links_actor() {
        let repo = MemoryRepository::new(clock());
        let new = NewUser::new("turista", "pass123", Role::Traveler, fixtures::profile("Juan"))
            .unwrap();
        let user = repo
            .commit_registration(
                new,
                activity(ActivityAction::UserRegistered),
                vec![note(1, "registration")],
            )
            .await
            .unwrap();

        let snapshot = repo.snapshot().await;
        assert_eq!(snapshot.users[&user.id].username, "turista");
        assert_eq!(snapshot.activity.len(), 1);
        assert_eq!(snapshot.activity[0].actor_id, user.id);
        assert_eq!(snapshot.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_registration_duplicate_writes_nothing() {
        let repo = MemoryRepository::new(clock());
        repo.create_user(
            NewUser::new("turista", "pass123", Role::Traveler, fixtures::profile("Juan")).unwrap(),
        )
        .await
        .unwrap();
        let before = repo.snapshot().await;

        let result = repo
            .commit_registration(
                NewUser::new("turista", "other", Role::Traveler, fixtures::profile("Ana")).unwrap(),
                activity(ActivityAction::UserRegistered),
                vec![note(1, "registration")],
            )
            .await;

        assert_err_variant!(result, BorderpassError::Validation(_));
        assert_eq!(repo.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_users() {
        let repo = MemoryRepository::new(clock());
        let traveler = repo
            .create_user(
                NewUser::new("turista", "pass123", Role::Traveler, fixtures::profile("Juan"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let duplicate = repo
            .create_user(
                NewUser::new("turista", "pass123", Role::Traveler, fixtures::profile("Juan"))
                    .unwrap(),
            )
            .await;
        assert_err_variant!(duplicate, BorderpassError::Validation(_));

        assert!(repo.list_active_by_role(Role::Traveler).await.unwrap().is_empty());
        repo.set_active(traveler.id, true).await.unwrap();
        assert_eq!(repo.list_active_by_role(Role::Traveler).await.unwrap().len(), 1);

        let found = repo.find_by_username("turista").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(traveler.id));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_user_with_explicit_id() {
        let repo = MemoryRepository::new(clock());
        let user = NewUser::new("t42", "pass123", Role::Traveler, fixtures::profile("T"))
            .unwrap()
            .into_user(42, Utc::now());
        repo.insert_user(user).await.unwrap();

        let next = repo
            .create_user(NewUser::new("next", "pass123", Role::Administrator, fixtures::profile("A")).unwrap())
            .await
            .unwrap();
        assert_eq!(next.id, 43);
    }
}
