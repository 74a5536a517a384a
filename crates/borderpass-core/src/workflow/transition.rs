//! Pure transition planning.
//!
//! Nothing here touches a store. Each planner takes the current state and
//! returns what should change: the process update, the single activity entry,
//! and the notifications to send. Recipients may be a role pool, which the
//! caller resolves against the user directory before committing.

use super::decision::{Decision, Outcome, Stage};
use crate::access::{can_access, Role};
use crate::domain::{
    ActivityAction, AgricultureStatus, FinalStatus, IdentityStatus, NewActivity, NewProcess,
    NewUser, OverallStatus, Process, ProcessUpdate, Review, Severity, User,
};
use crate::error::{BorderpassError, Result};

/// Who a notification goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    User(i64),
    /// Every active user holding the role.
    Pool(Role),
}

/// A notification before its recipients are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl NotificationDraft {
    fn new(
        recipient: Recipient,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            title: title.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Side effects that accompany every successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effects {
    pub activity: NewActivity,
    pub notifications: Vec<NotificationDraft>,
}

/// A planned review decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub update: ProcessUpdate,
    pub effects: Effects,
}

/// Plan the effects of a traveler submitting a new process.
///
/// The activity's `process_id` is left empty; the store fills it in once
/// the process has an id.
pub fn plan_submission(new: &NewProcess) -> Result<Effects> {
    new.validate()?;

    Ok(Effects {
        activity: NewActivity {
            actor_id: new.owner_id,
            process_id: None,
            action: ActivityAction::ProcessCreated,
            details: format!("Created {} process", new.kind),
        },
        notifications: vec![NotificationDraft::new(
            Recipient::Pool(Role::AgricultureReviewer),
            Severity::Info,
            "New process for review",
            format!("A {} requires agriculture review", new.kind.label()),
        )],
    })
}

/// Plan a review decision against the current state of `process`.
///
/// Fails with `InvalidTransition` when the actor does not own the stage, the
/// process is not waiting on that stage, or the outcome does not apply there.
/// Only then is a missing observation reported as `Validation`.
pub fn plan_decision(
    process: &Process,
    actor_id: i64,
    actor_role: Role,
    decision: &Decision,
) -> Result<Transition> {
    check_legal(process, actor_role, decision)?;

    let observation = match (decision.outcome.requires_observation(), decision.observation_text()) {
        (true, None) => {
            return Err(BorderpassError::Validation(format!(
                "an observation is required to {} a process",
                decision.outcome
            )))
        }
        (_, text) => text.map(str::to_string),
    };

    let owner = Recipient::User(process.owner_id);
    let label = process.kind.label();
    let id = process.id;

    let (update, action, details, notifications) = match (decision.stage, decision.outcome) {
        (Stage::Agriculture, Outcome::Approve) => (
            ProcessUpdate {
                overall_status: Some(OverallStatus::IdentityReview),
                agriculture_review: Some(review(AgricultureStatus::Approved, observation)),
                identity_review: Some(Review::new(IdentityStatus::Pending)),
                ..Default::default()
            },
            ActivityAction::AgricultureApproved,
            "Agriculture review approved".to_string(),
            vec![NotificationDraft::new(
                Recipient::Pool(Role::IdentityReviewer),
                Severity::Info,
                "Process approved by agriculture",
                format!("Process {} requires identity review", id),
            )],
        ),
        (Stage::Agriculture, Outcome::Reject) => {
            let text = observation.clone().unwrap_or_default();
            (
                ProcessUpdate {
                    overall_status: Some(OverallStatus::Rejected),
                    agriculture_review: Some(review(AgricultureStatus::Rejected, observation)),
                    final_status: Some(FinalStatus::Rejected),
                    ..Default::default()
                },
                ActivityAction::AgricultureRejected,
                format!("Agriculture review rejected: {}", text),
                vec![NotificationDraft::new(
                    owner,
                    Severity::Error,
                    "Process rejected",
                    format!(
                        "Your {} was rejected by the agriculture authority: {}",
                        label, text
                    ),
                )],
            )
        }
        (Stage::Identity, Outcome::Approve) => (
            ProcessUpdate {
                overall_status: Some(OverallStatus::Approved),
                identity_review: Some(review(
                    IdentityStatus::Approved,
                    observation.or_else(|| {
                        process
                            .identity_review
                            .as_ref()
                            .and_then(|r| r.observations.clone())
                    }),
                )),
                final_status: Some(FinalStatus::Approved),
                ..Default::default()
            },
            ActivityAction::IdentityApproved,
            "Identity review approved".to_string(),
            vec![
                NotificationDraft::new(
                    Recipient::Pool(Role::Administrator),
                    Severity::Success,
                    "Process ready for final approval",
                    format!("Process {} was approved by the identity authority", id),
                ),
                NotificationDraft::new(
                    owner,
                    Severity::Success,
                    "Process approved",
                    format!("Your {} has been approved", label),
                ),
            ],
        ),
        (Stage::Identity, Outcome::Observe) => {
            let text = observation.clone().unwrap_or_default();
            (
                ProcessUpdate {
                    identity_review: Some(review(IdentityStatus::Observed, observation)),
                    ..Default::default()
                },
                ActivityAction::IdentityObserved,
                format!("Identity review observed: {}", text),
                vec![NotificationDraft::new(
                    owner,
                    Severity::Warning,
                    "Process observed",
                    format!("The identity authority observed your {}: {}", label, text),
                )],
            )
        }
        (Stage::Identity, Outcome::Reject) => {
            let text = observation.clone().unwrap_or_default();
            (
                ProcessUpdate {
                    overall_status: Some(OverallStatus::Rejected),
                    identity_review: Some(review(IdentityStatus::Rejected, observation)),
                    final_status: Some(FinalStatus::Rejected),
                    ..Default::default()
                },
                ActivityAction::IdentityRejected,
                format!("Identity review rejected: {}", text),
                vec![NotificationDraft::new(
                    owner,
                    Severity::Error,
                    "Process rejected",
                    format!(
                        "Your {} was rejected by the identity authority: {}",
                        label, text
                    ),
                )],
            )
        }
        (Stage::Agriculture, Outcome::Observe) => {
            return Err(BorderpassError::Internal(
                "observe at the agriculture stage passed the legality check".into(),
            ))
        }
    };

    Ok(Transition {
        update,
        effects: Effects {
            activity: NewActivity {
                actor_id,
                process_id: Some(id),
                action,
                details,
            },
            notifications,
        },
    })
}

fn check_legal(process: &Process, actor_role: Role, decision: &Decision) -> Result<()> {
    let stage = decision.stage;
    if !can_access(actor_role, stage.action()) {
        return Err(BorderpassError::InvalidTransition(format!(
            "role {} cannot decide the {} stage",
            actor_role, stage
        )));
    }

    let waiting_on = match stage {
        Stage::Agriculture => OverallStatus::AgricultureReview,
        Stage::Identity => OverallStatus::IdentityReview,
    };
    if process.overall_status != waiting_on {
        return Err(BorderpassError::InvalidTransition(format!(
            "process {} is {}, not waiting on {} review",
            process.id, process.overall_status, stage
        )));
    }

    match (stage, decision.outcome) {
        (Stage::Agriculture, Outcome::Observe) => Err(BorderpassError::InvalidTransition(
            "observe does not apply to the agriculture stage".into(),
        )),
        (Stage::Identity, Outcome::Approve)
            if process.agriculture_review.status != AgricultureStatus::Approved =>
        {
            Err(BorderpassError::InvalidTransition(format!(
                "process {} has not been approved by agriculture",
                process.id
            )))
        }
        _ => Ok(()),
    }
}

fn review<S>(status: S, observations: Option<String>) -> Review<S> {
    Review {
        status,
        observations,
    }
}

/// Plan the effects of a traveler registering an account.
///
/// The activity's `actor_id` is left at zero; the store fills it in once
/// the user has an id.
pub fn plan_registration(user: &NewUser) -> Effects {
    Effects {
        activity: NewActivity {
            actor_id: 0,
            process_id: None,
            action: ActivityAction::UserRegistered,
            details: format!("Registered {}", user.username),
        },
        notifications: vec![NotificationDraft::new(
            Recipient::Pool(Role::Administrator),
            Severity::Info,
            "New registration request",
            format!("User {} requests account activation", user.profile.name),
        )],
    }
}

/// Plan the effects of an administrator activating an account.
pub fn plan_activation(admin_id: i64, user: &User) -> Effects {
    Effects {
        activity: NewActivity {
            actor_id: admin_id,
            process_id: None,
            action: ActivityAction::UserActivated,
            details: format!("Activated {}", user.username),
        },
        notifications: vec![NotificationDraft::new(
            Recipient::User(user.id),
            Severity::Success,
            "Account activated",
            "Your account has been activated",
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Action;
    use crate::domain::{DeclarationForm, FormPayload, ProcessKind, UserProfile};

    fn declaration() -> NewProcess {
        NewProcess {
            owner_id: 42,
            kind: ProcessKind::Declaration,
            payload: FormPayload::Declaration(DeclarationForm {
                truth_declared: true,
                ..Default::default()
            }),
        }
    }

    fn submitted() -> Process {
        Process::submitted(7, declaration(), chrono::Utc::now())
    }

    fn apply(process: &mut Process, transition: &Transition) {
        transition
            .update
            .apply_to(process, chrono::Utc::now())
            .unwrap();
    }

    fn in_identity_review() -> Process {
        let mut process = submitted();
        let t = plan_decision(
            &process,
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Approve),
        )
        .unwrap();
        apply(&mut process, &t);
        process
    }

    #[test]
    fn test_submission_notifies_agriculture_pool() {
        let effects = plan_submission(&declaration()).unwrap();
        assert_eq!(effects.activity.action, ActivityAction::ProcessCreated);
        assert_eq!(effects.activity.actor_id, 42);
        assert_eq!(effects.notifications.len(), 1);
        assert_eq!(
            effects.notifications[0].recipient,
            Recipient::Pool(Role::AgricultureReviewer)
        );
        assert_eq!(effects.notifications[0].severity, Severity::Info);
    }

    #[test]
    fn test_submission_validates_payload() {
        let mut new = declaration();
        new.payload = FormPayload::Declaration(DeclarationForm::default());
        assert!(matches!(
            plan_submission(&new),
            Err(BorderpassError::Validation(_))
        ));
    }

    #[test]
    fn test_agriculture_approve() {
        let process = in_identity_review();
        assert_eq!(process.overall_status, OverallStatus::IdentityReview);
        assert_eq!(process.agriculture_review.status, AgricultureStatus::Approved);
        assert_eq!(process.identity_status(), IdentityStatus::Pending);
        assert!(process.final_status.is_none());
    }

    #[test]
    fn test_agriculture_approve_notifies_identity_pool() {
        let t = plan_decision(
            &submitted(),
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Approve),
        )
        .unwrap();
        assert_eq!(t.effects.activity.action, ActivityAction::AgricultureApproved);
        assert_eq!(t.effects.activity.process_id, Some(7));
        assert_eq!(
            t.effects.notifications[0].recipient,
            Recipient::Pool(Role::IdentityReviewer)
        );
    }

    #[test]
    fn test_agriculture_reject_only_notifies_owner() {
        let mut process = submitted();
        let t = plan_decision(
            &process,
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Reject).with_observation("fresh fruit"),
        )
        .unwrap();

        assert_eq!(t.effects.notifications.len(), 1);
        let note = &t.effects.notifications[0];
        assert_eq!(note.recipient, Recipient::User(42));
        assert_eq!(note.severity, Severity::Error);
        assert!(note.message.contains("fresh fruit"));
        assert!(t
            .effects
            .notifications
            .iter()
            .all(|n| n.recipient != Recipient::Pool(Role::IdentityReviewer)));

        apply(&mut process, &t);
        assert_eq!(process.overall_status, OverallStatus::Rejected);
        assert_eq!(process.final_status, Some(FinalStatus::Rejected));
        assert_eq!(
            process.agriculture_review.observations.as_deref(),
            Some("fresh fruit")
        );
        assert!(process.identity_review.is_none());
    }

    #[test]
    fn test_identity_approve_notifies_admins_and_owner() {
        let mut process = in_identity_review();
        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve),
        )
        .unwrap();

        let recipients: Vec<_> = t.effects.notifications.iter().map(|n| n.recipient).collect();
        assert_eq!(
            recipients,
            vec![Recipient::Pool(Role::Administrator), Recipient::User(42)]
        );
        assert!(t
            .effects
            .notifications
            .iter()
            .all(|n| n.severity == Severity::Success));

        apply(&mut process, &t);
        assert_eq!(process.overall_status, OverallStatus::Approved);
        assert_eq!(process.final_status, Some(FinalStatus::Approved));
    }

    #[test]
    fn test_identity_approve_keeps_earlier_observation() {
        let mut process = in_identity_review();
        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Observe).with_observation("expired id"),
        )
        .unwrap();
        apply(&mut process, &t);

        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve),
        )
        .unwrap();
        apply(&mut process, &t);
        let review = process.identity_review.as_ref().unwrap();
        assert_eq!(review.status, IdentityStatus::Approved);
        assert_eq!(review.observations.as_deref(), Some("expired id"));

        // An approve with its own note replaces the earlier one.
        let mut process = in_identity_review();
        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve).with_observation("renewed"),
        )
        .unwrap();
        apply(&mut process, &t);
        assert_eq!(
            process.identity_review.unwrap().observations.as_deref(),
            Some("renewed")
        );
    }

    #[test]
    fn test_identity_observe_keeps_stage_open() {
        let mut process = in_identity_review();
        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Observe).with_observation("expired id"),
        )
        .unwrap();
        assert_eq!(t.effects.notifications[0].severity, Severity::Warning);
        assert!(t.effects.notifications[0].message.contains("expired id"));

        apply(&mut process, &t);
        assert_eq!(process.overall_status, OverallStatus::IdentityReview);
        assert_eq!(process.identity_status(), IdentityStatus::Observed);

        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Reject).with_observation("still expired"),
        )
        .unwrap();
        apply(&mut process, &t);
        assert_eq!(process.overall_status, OverallStatus::Rejected);
        assert_eq!(process.identity_status(), IdentityStatus::Rejected);
        assert_eq!(process.final_status, Some(FinalStatus::Rejected));
    }

    #[test]
    fn test_wrong_role_is_invalid_transition() {
        let process = submitted();
        for role in [Role::Traveler, Role::Administrator, Role::IdentityReviewer] {
            let result = plan_decision(
                &process,
                1,
                role,
                &Decision::new(Stage::Agriculture, Outcome::Approve),
            );
            assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
        }
    }

    #[test]
    fn test_decide_gate_follows_permission_table() {
        let process = in_identity_review();
        for role in Role::all() {
            let result = plan_decision(
                &process,
                1,
                role,
                &Decision::new(Stage::Identity, Outcome::Approve),
            );
            if can_access(role, Action::ReviewIdentity) {
                assert!(result.is_ok());
            } else {
                assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
            }
        }
    }

    #[test]
    fn test_wrong_stage_is_invalid_transition() {
        let result = plan_decision(
            &submitted(),
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));

        let result = plan_decision(
            &in_identity_review(),
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Approve),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
    }

    #[test]
    fn test_observe_at_agriculture_is_invalid_transition() {
        let result = plan_decision(
            &submitted(),
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Observe).with_observation("hmm"),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
    }

    #[test]
    fn test_terminal_process_rejects_decisions() {
        let mut process = in_identity_review();
        let t = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve),
        )
        .unwrap();
        apply(&mut process, &t);

        let result = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Reject).with_observation("late"),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
    }

    #[test]
    fn test_identity_approve_requires_agriculture_approval() {
        let mut process = submitted();
        process.overall_status = OverallStatus::IdentityReview;

        let result = plan_decision(
            &process,
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Approve),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
    }

    #[test]
    fn test_missing_observation_is_validation_error() {
        let result = plan_decision(
            &submitted(),
            2,
            Role::AgricultureReviewer,
            &Decision::new(Stage::Agriculture, Outcome::Reject).with_observation("  "),
        );
        assert!(matches!(result, Err(BorderpassError::Validation(_))));

        let result = plan_decision(
            &in_identity_review(),
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Observe),
        );
        assert!(matches!(result, Err(BorderpassError::Validation(_))));
    }

    #[test]
    fn test_illegal_transition_reported_before_missing_observation() {
        let result = plan_decision(
            &submitted(),
            3,
            Role::IdentityReviewer,
            &Decision::new(Stage::Identity, Outcome::Reject),
        );
        assert!(matches!(result, Err(BorderpassError::InvalidTransition(_))));
    }

    #[test]
    fn test_registration_and_activation_effects() {
        let new = NewUser::new(
            "turista",
            "pass123",
            Role::Traveler,
            UserProfile {
                name: "Juan Perez".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let effects = plan_registration(&new);
        assert_eq!(effects.activity.action, ActivityAction::UserRegistered);
        assert_eq!(
            effects.notifications[0].recipient,
            Recipient::Pool(Role::Administrator)
        );
        assert!(effects.notifications[0].message.contains("Juan Perez"));

        let user = new.into_user(9, chrono::Utc::now());

        let effects = plan_activation(1, &user);
        assert_eq!(effects.activity.action, ActivityAction::UserActivated);
        assert_eq!(effects.activity.actor_id, 1);
        assert_eq!(effects.notifications[0].recipient, Recipient::User(9));
    }
}
