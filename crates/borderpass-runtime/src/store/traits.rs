use std::future::Future;

use borderpass_core::access::Role;
use borderpass_core::domain::{
    ActivityLogEntry, NewActivity, NewNotification, NewProcess, NewUser, Notification, Process,
    ProcessUpdate, User,
};
use borderpass_core::Result;

/// Process records keyed by id.
pub trait ProcessStore: Send + Sync {
    /// Insert a freshly submitted process, assigning its id and timestamps.
    fn create_process(&self, new: NewProcess) -> impl Future<Output = Result<Process>> + Send;

    /// Fetch a process, or `NotFound`.
    fn get_process(&self, id: i64) -> impl Future<Output = Result<Process>> + Send;

    /// All processes owned by a traveler, by id ascending.
    fn list_by_owner(&self, owner_id: i64) -> impl Future<Output = Result<Vec<Process>>> + Send;

    /// The work queue a role sees, by id ascending.
    ///
    /// Reviewers see processes waiting on their stage, administrators see
    /// everything, travelers see nothing here.
    fn list_for_role(&self, role: Role) -> impl Future<Output = Result<Vec<Process>>> + Send;

    /// Apply an update, bumping `version` and refreshing `updated_at`.
    fn update_process(
        &self,
        id: i64,
        update: ProcessUpdate,
    ) -> impl Future<Output = Result<Process>> + Send;
}

/// Per-user notifications.
pub trait NotificationStore: Send + Sync {
    fn create_notification(
        &self,
        new: NewNotification,
    ) -> impl Future<Output = Result<Notification>> + Send;

    /// Newest first; ties broken by id descending.
    fn list_by_user(&self, user_id: i64)
        -> impl Future<Output = Result<Vec<Notification>>> + Send;

    /// Mark a notification read. Unknown ids are ignored.
    fn mark_read(&self, id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Append-only audit trail.
pub trait ActivityLog: Send + Sync {
    fn append(&self, entry: NewActivity) -> impl Future<Output = Result<ActivityLogEntry>> + Send;

    /// Entries for one process, newest first.
    fn list_by_process(
        &self,
        process_id: i64,
    ) -> impl Future<Output = Result<Vec<ActivityLogEntry>>> + Send;
}

/// User accounts and role pools.
pub trait UserDirectory: Send + Sync {
    /// Fetch a user, or `NotFound`.
    fn get_user(&self, id: i64) -> impl Future<Output = Result<User>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Create a user. A taken username is a `Validation` error.
    fn create_user(&self, new: NewUser) -> impl Future<Output = Result<User>> + Send;

    /// Every active user holding `role`, by id ascending.
    fn list_active_by_role(&self, role: Role) -> impl Future<Output = Result<Vec<User>>> + Send;

    fn set_active(&self, id: i64, active: bool) -> impl Future<Output = Result<User>> + Send;

    fn count_users(&self) -> impl Future<Output = Result<i64>> + Send;
}

/// A backing store that can commit a transition's effects as one unit.
///
/// Either every write in a commit lands, or none do.
pub trait Repository:
    ProcessStore + NotificationStore + ActivityLog + UserDirectory + Clone + 'static
{
    /// Create a process together with its activity entry and notifications.
    ///
    /// The new process id is written into the activity entry and every
    /// notification.
    fn commit_submission(
        &self,
        new: NewProcess,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> impl Future<Output = Result<Process>> + Send;

    /// Apply a process update together with its activity entry and notifications.
    ///
    /// Fails with `InvalidTransition` if the stored version is no longer
    /// `expected_version`, and with `Internal` if the process has vanished.
    fn commit_transition(
        &self,
        process_id: i64,
        expected_version: i64,
        update: ProcessUpdate,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> impl Future<Output = Result<Process>> + Send;

    /// Create a user together with its registration activity and notifications.
    ///
    /// The new user id becomes the activity's actor. A taken username is a
    /// `Validation` error and writes nothing.
    fn commit_registration(
        &self,
        new: NewUser,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Record an activity entry and its notifications with no process change.
    fn commit_effects(
        &self,
        activity: NewActivity,
        notifications: Vec<NewNotification>,
    ) -> impl Future<Output = Result<()>> + Send;
}
