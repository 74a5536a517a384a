use std::sync::Arc;

use tracing::{debug, info, warn};

use borderpass_core::access::{can_access, can_read_process, Action, Role};
use borderpass_core::domain::{
    ActivityLogEntry, FormPayload, NewNotification, NewProcess, NewUser, Notification, Process,
    ProcessKind, ProcessStats, User, UserProfile,
};
use borderpass_core::workflow::{
    plan_activation, plan_decision, plan_registration, plan_submission, Decision,
    NotificationDraft, Recipient, Stage,
};
use borderpass_core::{BorderpassError, Clock, Result};

use super::locks::ProcessLocks;
use crate::store::{ActivityLog, NotificationStore, ProcessStore, Repository, UserDirectory};

/// Applies workflow transitions against a repository.
///
/// Every decision runs read, plan and commit while holding the process's
/// lock, and the commit re-checks the version it planned against.
#[derive(Clone)]
pub struct WorkflowEngine<R> {
    repo: R,
    clock: Arc<dyn Clock>,
    locks: ProcessLocks,
}

impl<R: Repository> WorkflowEngine<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            locks: ProcessLocks::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Submit a new process on behalf of an active traveler.
    pub async fn submit_process(
        &self,
        owner_id: i64,
        kind: ProcessKind,
        payload: FormPayload,
    ) -> Result<Process> {
        let owner = self.verify_caller(Role::Traveler, owner_id).await?;
        require(owner.role, Action::SubmitForm)?;

        let new = NewProcess {
            owner_id,
            kind,
            payload,
        };
        let effects = plan_submission(&new)?;
        let notifications = self.resolve(effects.notifications, None).await?;
        let process = self
            .repo
            .commit_submission(new, effects.activity, notifications)
            .await?;

        info!(process_id = process.id, owner_id, kind = %kind, "Process submitted");
        Ok(process)
    }

    /// Fetch a process the caller is allowed to read.
    pub async fn get_process(&self, role: Role, caller_id: i64, process_id: i64) -> Result<Process> {
        let process = self.repo.get_process(process_id).await?;
        self.verify_caller(role, caller_id).await?;
        if !can_read_process(role, caller_id, &process) {
            return Err(BorderpassError::AccessDenied(format!(
                "{} {} may not read process {}",
                role, caller_id, process_id
            )));
        }
        Ok(process)
    }

    /// Travelers get their own processes; staff get their work queue.
    pub async fn list_processes(&self, role: Role, caller_id: i64) -> Result<Vec<Process>> {
        self.verify_caller(role, caller_id).await?;
        let action = match role {
            Role::Traveler => Action::ReadOwnProcesses,
            Role::AgricultureReviewer => Stage::Agriculture.action(),
            Role::IdentityReviewer => Stage::Identity.action(),
            Role::Administrator => Action::ReadAllProcesses,
        };
        require(role, action)?;

        match role {
            Role::Traveler => self.repo.list_by_owner(caller_id).await,
            _ => self.repo.list_for_role(role).await,
        }
    }

    /// Apply a reviewer's decision.
    pub async fn decide(
        &self,
        role: Role,
        caller_id: i64,
        process_id: i64,
        decision: Decision,
    ) -> Result<Process> {
        let _guard = self.locks.lock(process_id).await;

        let process = self.repo.get_process(process_id).await?;
        self.verify_caller(role, caller_id).await?;
        let transition = plan_decision(&process, caller_id, role, &decision)?;

        let notifications = self
            .resolve(transition.effects.notifications, Some(process_id))
            .await?;
        let updated = self
            .repo
            .commit_transition(
                process_id,
                process.version,
                transition.update,
                transition.effects.activity,
                notifications,
            )
            .await?;

        info!(
            process_id,
            actor_id = caller_id,
            stage = %decision.stage,
            outcome = %decision.outcome,
            status = %updated.overall_status,
            "Review decision applied"
        );
        Ok(updated)
    }

    pub async fn list_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        self.repo.list_by_user(user_id).await
    }

    /// Mark a notification read. Unknown ids are ignored.
    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<()> {
        self.repo.mark_read(notification_id).await
    }

    /// Mark one of the caller's own notifications read.
    ///
    /// Ids that are unknown or belong to someone else are ignored.
    pub async fn mark_own_notification_read(&self, user_id: i64, notification_id: i64) -> Result<()> {
        let owned = self
            .repo
            .list_by_user(user_id)
            .await?
            .iter()
            .any(|n| n.id == notification_id);
        if !owned {
            debug!(user_id, notification_id, "Ignoring read mark for foreign or unknown notification");
            return Ok(());
        }
        self.repo.mark_read(notification_id).await
    }

    /// Activity entries for a process, newest first.
    pub async fn list_activity(&self, process_id: i64) -> Result<Vec<ActivityLogEntry>> {
        self.repo.list_by_process(process_id).await
    }

    /// Activity entries for a process the caller is allowed to read.
    pub async fn list_activity_for(
        &self,
        role: Role,
        caller_id: i64,
        process_id: i64,
    ) -> Result<Vec<ActivityLogEntry>> {
        self.get_process(role, caller_id, process_id).await?;
        self.list_activity(process_id).await
    }

    /// Create an inactive traveler account and ask administrators to activate it.
    pub async fn register_traveler(
        &self,
        username: &str,
        password: &str,
        profile: UserProfile,
    ) -> Result<User> {
        let new = NewUser::new(username, password, Role::Traveler, profile)?;
        let effects = plan_registration(&new);
        let notifications = self.resolve(effects.notifications, None).await?;
        let user = self
            .repo
            .commit_registration(new, effects.activity, notifications)
            .await?;

        info!(user_id = user.id, username = %user.username, "Traveler registered");
        Ok(user)
    }

    /// Check credentials for an active account.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .filter(|u| u.verify_password(password))
            .ok_or_else(|| BorderpassError::Unauthorized("invalid username or password".into()))?;

        if !user.is_active {
            return Err(BorderpassError::Unauthorized(
                "account is pending activation".into(),
            ));
        }
        debug!(user_id = user.id, role = %user.role, "User authenticated");
        Ok(user)
    }

    /// Activate an account. Activating an active account changes nothing.
    pub async fn activate_user(&self, role: Role, caller_id: i64, user_id: i64) -> Result<User> {
        self.verify_caller(role, caller_id).await?;
        require(role, Action::ActivateUsers)?;

        let user = self.repo.get_user(user_id).await?;
        if user.is_active {
            return Ok(user);
        }

        let user = self.repo.set_active(user_id, true).await?;
        let effects = plan_activation(caller_id, &user);
        let notifications = self.resolve(effects.notifications, None).await?;
        self.repo.commit_effects(effects.activity, notifications).await?;

        info!(user_id, admin_id = caller_id, "User activated");
        Ok(user)
    }

    /// Dashboard counts over every process.
    pub async fn process_stats(&self, role: Role, caller_id: i64) -> Result<ProcessStats> {
        self.verify_caller(role, caller_id).await?;
        require(role, Action::ViewReports)?;

        let processes = self.repo.list_for_role(Role::Administrator).await?;
        Ok(ProcessStats::from_processes(
            &processes,
            self.clock.now().date_naive(),
        ))
    }

    /// Create one active account per role when the directory is empty.
    pub async fn seed_demo_users(&self, password: &str) -> Result<Vec<User>> {
        if self.repo.count_users().await? > 0 {
            debug!("User directory not empty, skipping demo seed");
            return Ok(Vec::new());
        }

        let accounts = [
            ("admin", Role::Administrator, "Customs Administrator"),
            ("traveler", Role::Traveler, "Demo Traveler"),
            ("agriculture", Role::AgricultureReviewer, "Agriculture Inspector"),
            ("identity", Role::IdentityReviewer, "Identity Officer"),
        ];

        let mut seeded = Vec::with_capacity(accounts.len());
        for (username, role, name) in accounts {
            let mut new = NewUser::new(
                username,
                password,
                role,
                UserProfile {
                    name: name.to_string(),
                    ..Default::default()
                },
            )?;
            new.is_active = true;
            seeded.push(self.repo.create_user(new).await?);
        }

        info!(count = seeded.len(), "Seeded demo users");
        Ok(seeded)
    }

    /// Check that the caller exists, is active and holds the claimed role.
    async fn verify_caller(&self, role: Role, caller_id: i64) -> Result<User> {
        let user = match self.repo.get_user(caller_id).await {
            Ok(user) => user,
            Err(BorderpassError::NotFound(_)) => {
                return Err(BorderpassError::AccessDenied(format!(
                    "unknown user {}",
                    caller_id
                )))
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(BorderpassError::AccessDenied(format!(
                "account {} is not active",
                caller_id
            )));
        }
        if user.role != role {
            return Err(BorderpassError::AccessDenied(format!(
                "user {} does not hold role {}",
                caller_id, role
            )));
        }
        Ok(user)
    }

    /// Turn drafts into one notification per recipient, expanding role pools.
    async fn resolve(
        &self,
        drafts: Vec<NotificationDraft>,
        process_id: Option<i64>,
    ) -> Result<Vec<NewNotification>> {
        let mut notifications = Vec::new();
        for draft in drafts {
            let recipients = match draft.recipient {
                Recipient::User(id) => vec![id],
                Recipient::Pool(role) => {
                    let pool: Vec<i64> = self
                        .repo
                        .list_active_by_role(role)
                        .await?
                        .into_iter()
                        .map(|u| u.id)
                        .collect();
                    if pool.is_empty() {
                        warn!(role = %role, title = %draft.title, "No active users in notification pool");
                    }
                    pool
                }
            };

            notifications.extend(recipients.into_iter().map(|user_id| NewNotification {
                user_id,
                process_id,
                title: draft.title.clone(),
                message: draft.message.clone(),
                severity: draft.severity,
            }));
        }
        Ok(notifications)
    }
}

fn require(role: Role, action: Action) -> Result<()> {
    if can_access(role, action) {
        Ok(())
    } else {
        Err(BorderpassError::AccessDenied(format!(
            "role {} may not {}",
            role, action
        )))
    }
}
