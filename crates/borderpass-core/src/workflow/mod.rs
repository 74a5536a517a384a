mod decision;
mod transition;

pub use decision::{Decision, Outcome, Stage};
pub use transition::{
    plan_activation, plan_decision, plan_registration, plan_submission, Effects,
    NotificationDraft, Recipient, Transition,
};
