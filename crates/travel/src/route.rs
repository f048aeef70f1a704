//! Approval route propagation.
//!
//! The route is an ordered list of named steps tracked alongside the request
//! status. Propagation is a pure function from the current step list and a
//! transition id to a new step list; already-decided steps are never altered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::StepId;

use crate::rules::TransitionId;
use crate::status::{Actor, TravelRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Manager,
    TravelDesk,
    Finance,
    Booking,
    Settlement,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::TravelDesk => "travel_desk",
            Self::Finance => "finance",
            Self::Booking => "booking",
            Self::Settlement => "settlement",
        }
    }
}

/// Step lifecycle is forward-only: waiting, pending, then one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Waiting,
    Pending,
    Approved,
    Rejected,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub id: StepId,
    pub kind: StepKind,
    pub role: TravelRole,
    pub status: StepStatus,
    pub actor_name: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl ApprovalStep {
    fn waiting(kind: StepKind, role: TravelRole) -> Self {
        Self {
            id: StepId::new(),
            kind,
            role,
            status: StepStatus::Waiting,
            actor_name: None,
            decided_at: None,
            note: None,
        }
    }
}

/// The fixed five-step route seeded at request creation, all waiting.
pub fn initial_route() -> Vec<ApprovalStep> {
    vec![
        ApprovalStep::waiting(StepKind::Manager, TravelRole::Manager),
        ApprovalStep::waiting(StepKind::TravelDesk, TravelRole::TravelDesk),
        ApprovalStep::waiting(StepKind::Finance, TravelRole::Finance),
        ApprovalStep::waiting(StepKind::Booking, TravelRole::TravelDesk),
        ApprovalStep::waiting(StepKind::Settlement, TravelRole::Finance),
    ]
}

/// Apply a transition's fixed step mutations, returning a new step list.
pub fn propagate(
    steps: &[ApprovalStep],
    transition: TransitionId,
    actor: &Actor,
    now: DateTime<Utc>,
    note: Option<&str>,
) -> Vec<ApprovalStep> {
    let mut steps = steps.to_vec();

    match transition {
        TransitionId::SubmitRequest => {
            flip_pending(&mut steps, StepKind::Manager);
        }
        TransitionId::ManagerApprove => {
            decide(&mut steps, StepKind::Manager, StepStatus::Approved, actor, now, note);
            flip_pending(&mut steps, StepKind::TravelDesk);
        }
        TransitionId::TravelDeskReview => {
            decide(&mut steps, StepKind::TravelDesk, StepStatus::Approved, actor, now, note);
            flip_pending(&mut steps, StepKind::Finance);
        }
        TransitionId::FinanceApprove => {
            decide(&mut steps, StepKind::Finance, StepStatus::Approved, actor, now, note);
            flip_pending(&mut steps, StepKind::Booking);
        }
        TransitionId::ConfirmBooking => {
            decide(&mut steps, StepKind::Booking, StepStatus::Approved, actor, now, note);
            flip_pending(&mut steps, StepKind::Settlement);
        }
        TransitionId::CloseTrip => {
            decide(&mut steps, StepKind::Settlement, StepStatus::Approved, actor, now, note);
        }
        TransitionId::RejectRequest => {
            reject_pending(&mut steps, actor, now, note);
            skip_open(&mut steps, now, "route closed after rejection");
        }
        TransitionId::CancelRequest => {
            skip_open(&mut steps, now, "route closed after cancellation");
        }
    }

    steps
}

/// Move a waiting step to pending. Decided steps stay untouched.
fn flip_pending(steps: &mut [ApprovalStep], kind: StepKind) {
    for step in steps.iter_mut() {
        if step.kind == kind && step.status == StepStatus::Waiting {
            step.status = StepStatus::Pending;
        }
    }
}

/// Record a terminal decision on a step that is still open.
fn decide(
    steps: &mut [ApprovalStep],
    kind: StepKind,
    status: StepStatus,
    actor: &Actor,
    now: DateTime<Utc>,
    note: Option<&str>,
) {
    for step in steps.iter_mut() {
        if step.kind == kind && !step.status.is_terminal() {
            step.status = status;
            step.actor_name = Some(actor.name.clone());
            step.decided_at = Some(now);
            step.note = note.map(str::to_string);
        }
    }
}

/// The step currently under decision takes the rejection itself.
fn reject_pending(steps: &mut [ApprovalStep], actor: &Actor, now: DateTime<Utc>, note: Option<&str>) {
    for step in steps.iter_mut() {
        if step.status == StepStatus::Pending {
            step.status = StepStatus::Rejected;
            step.actor_name = Some(actor.name.clone());
            step.decided_at = Some(now);
            step.note = note.map(str::to_string);
        }
    }
}

/// Close the route without retroactively altering already-decided steps.
fn skip_open(steps: &mut [ApprovalStep], now: DateTime<Utc>, reason: &str) {
    for step in steps.iter_mut() {
        if !step.status.is_terminal() {
            step.status = StepStatus::Skipped;
            step.decided_at = Some(now);
            step.note = Some(reason.to_string());
        }
    }
}
