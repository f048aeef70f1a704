//! Append-only audit trail.
//!
//! Exactly one event is appended per mutating operation; events are never
//! altered, removed, or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::AuditEventId;

use crate::rules::TransitionId;
use crate::status::{Actor, RequestStatus, TravelRole};

/// What a mutating operation did, rendered to a stable snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RequestCreated,
    Transition(TransitionId),
    BookingUpdated,
    ExpenseSubmitted,
    ExpenseApproved,
    ExpenseRejected,
    FinanceSyncSucceeded,
    FinanceSyncFailed,
}

impl AuditAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestCreated => "request_created",
            Self::Transition(id) => id.as_str(),
            Self::BookingUpdated => "booking_updated",
            Self::ExpenseSubmitted => "expense_submitted",
            Self::ExpenseApproved => "expense_approved",
            Self::ExpenseRejected => "expense_rejected",
            Self::FinanceSyncSucceeded => "finance_sync_succeeded",
            Self::FinanceSyncFailed => "finance_sync_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub at: DateTime<Utc>,
    pub actor_role: TravelRole,
    pub actor_name: String,
    pub action: AuditAction,
    pub from_status: Option<RequestStatus>,
    pub to_status: Option<RequestStatus>,
    pub note: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        actor: &Actor,
        from_status: Option<RequestStatus>,
        to_status: Option<RequestStatus>,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            at,
            actor_role: actor.role,
            actor_name: actor.name.clone(),
            action,
            from_status,
            to_status,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_actions_render_their_transition_id() {
        assert_eq!(AuditAction::Transition(TransitionId::SubmitRequest).name(), "submit_request");
        assert_eq!(AuditAction::Transition(TransitionId::CloseTrip).name(), "close_trip");
        assert_eq!(AuditAction::FinanceSyncFailed.name(), "finance_sync_failed");
    }
}
