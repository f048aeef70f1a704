//! Transition rule table and evaluator.
//!
//! The table is static and declarative; evaluation applies its checks in a
//! fixed precedence order and stops at the first failure, so exactly one
//! blocking reason is ever reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::TransitionBlock;
use tripflow_policy::ComplianceLevel;

use crate::finance::SyncStatus;
use crate::request::TravelRequest;
use crate::status::{RequestStatus, TravelRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionId {
    SubmitRequest,
    ManagerApprove,
    TravelDeskReview,
    FinanceApprove,
    ConfirmBooking,
    CloseTrip,
    RejectRequest,
    CancelRequest,
}

impl TransitionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmitRequest => "submit_request",
            Self::ManagerApprove => "manager_approve",
            Self::TravelDeskReview => "travel_desk_review",
            Self::FinanceApprove => "finance_approve",
            Self::ConfirmBooking => "confirm_booking",
            Self::CloseTrip => "close_trip",
            Self::RejectRequest => "reject_request",
            Self::CancelRequest => "cancel_request",
        }
    }
}

impl core::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransitionId {
    type Err = tripflow_core::TravelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submit_request" => Ok(Self::SubmitRequest),
            "manager_approve" => Ok(Self::ManagerApprove),
            "travel_desk_review" => Ok(Self::TravelDeskReview),
            "finance_approve" => Ok(Self::FinanceApprove),
            "confirm_booking" => Ok(Self::ConfirmBooking),
            "close_trip" => Ok(Self::CloseTrip),
            "reject_request" => Ok(Self::RejectRequest),
            "cancel_request" => Ok(Self::CancelRequest),
            other => Err(tripflow_core::TravelError::validation(format!(
                "unknown transition id '{other}'"
            ))),
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRule {
    pub id: TransitionId,
    pub from: &'static [RequestStatus],
    pub to: RequestStatus,
    pub roles: &'static [TravelRole],
    pub requires_note: bool,
}

const SUBMIT_REQUEST: TransitionRule = TransitionRule {
    id: TransitionId::SubmitRequest,
    from: &[RequestStatus::Draft],
    to: RequestStatus::Submitted,
    roles: &[TravelRole::Employee, TravelRole::Admin],
    requires_note: false,
};

const MANAGER_APPROVE: TransitionRule = TransitionRule {
    id: TransitionId::ManagerApprove,
    from: &[RequestStatus::Submitted],
    to: RequestStatus::ManagerApproved,
    roles: &[TravelRole::Manager, TravelRole::Admin],
    requires_note: false,
};

const TRAVEL_DESK_REVIEW: TransitionRule = TransitionRule {
    id: TransitionId::TravelDeskReview,
    from: &[RequestStatus::ManagerApproved],
    to: RequestStatus::TravelReview,
    roles: &[TravelRole::TravelDesk, TravelRole::Admin],
    requires_note: false,
};

const FINANCE_APPROVE: TransitionRule = TransitionRule {
    id: TransitionId::FinanceApprove,
    from: &[RequestStatus::TravelReview],
    to: RequestStatus::FinanceApproved,
    roles: &[TravelRole::Finance, TravelRole::Admin],
    requires_note: false,
};

const CONFIRM_BOOKING: TransitionRule = TransitionRule {
    id: TransitionId::ConfirmBooking,
    from: &[RequestStatus::FinanceApproved],
    to: RequestStatus::Booked,
    roles: &[TravelRole::TravelDesk, TravelRole::Admin],
    requires_note: false,
};

const CLOSE_TRIP: TransitionRule = TransitionRule {
    id: TransitionId::CloseTrip,
    from: &[RequestStatus::Booked],
    to: RequestStatus::Closed,
    roles: &[TravelRole::Finance, TravelRole::Admin],
    requires_note: false,
};

const REJECT_REQUEST: TransitionRule = TransitionRule {
    id: TransitionId::RejectRequest,
    from: &[
        RequestStatus::Submitted,
        RequestStatus::ManagerApproved,
        RequestStatus::TravelReview,
        RequestStatus::FinanceApproved,
    ],
    to: RequestStatus::Rejected,
    roles: &[
        TravelRole::Manager,
        TravelRole::TravelDesk,
        TravelRole::Finance,
        TravelRole::Admin,
    ],
    requires_note: true,
};

const CANCEL_REQUEST: TransitionRule = TransitionRule {
    id: TransitionId::CancelRequest,
    from: &[
        RequestStatus::Draft,
        RequestStatus::Submitted,
        RequestStatus::ManagerApproved,
        RequestStatus::TravelReview,
        RequestStatus::FinanceApproved,
    ],
    to: RequestStatus::Cancelled,
    roles: &[TravelRole::Employee, TravelRole::Admin],
    requires_note: true,
};

/// The complete transition table.
pub const RULES: &[TransitionRule] = &[
    SUBMIT_REQUEST,
    MANAGER_APPROVE,
    TRAVEL_DESK_REVIEW,
    FINANCE_APPROVE,
    CONFIRM_BOOKING,
    CLOSE_TRIP,
    REJECT_REQUEST,
    CANCEL_REQUEST,
];

/// Look up the rule for a transition id.
pub fn rule(id: TransitionId) -> &'static TransitionRule {
    match id {
        TransitionId::SubmitRequest => &RULES[0],
        TransitionId::ManagerApprove => &RULES[1],
        TransitionId::TravelDeskReview => &RULES[2],
        TransitionId::FinanceApprove => &RULES[3],
        TransitionId::ConfirmBooking => &RULES[4],
        TransitionId::CloseTrip => &RULES[5],
        TransitionId::RejectRequest => &RULES[6],
        TransitionId::CancelRequest => &RULES[7],
    }
}

/// Evaluate a transition against the current request and actor role.
///
/// `policy_level` is the level the caller wants checked: the freshly
/// recomputed one for `submit_request`, the stored snapshot otherwise. The
/// note requirement is the orchestrator's concern, not evaluated here.
pub fn evaluate(
    rule: &TransitionRule,
    request: &TravelRequest,
    actor_role: TravelRole,
    policy_level: ComplianceLevel,
    now: DateTime<Utc>,
) -> Result<(), TransitionBlock> {
    if !rule.from.contains(&request.status()) {
        return Err(TransitionBlock::StateNotAllowed);
    }

    if !rule.roles.contains(&actor_role) {
        return Err(TransitionBlock::RoleNotAllowed);
    }

    if rule.id == TransitionId::SubmitRequest && policy_level == ComplianceLevel::Blocked {
        return Err(TransitionBlock::PolicyBlocked);
    }

    if rule.id == TransitionId::CloseTrip {
        if now < request.trip().return_date {
            return Err(TransitionBlock::TripNotCompleted);
        }
        if request.booking().is_none() {
            return Err(TransitionBlock::BookingNotRecorded);
        }
        if request.expenses().iter().any(|e| e.is_pending()) {
            return Err(TransitionBlock::ExpensesPending);
        }
        let sync = request.finance_sync();
        let unsynced_approved = request.expenses().iter().any(|e| e.needs_sync());
        if unsynced_approved || matches!(sync.status, SyncStatus::Failed | SyncStatus::Pending) {
            return Err(TransitionBlock::FinanceSyncIncomplete);
        }
    }

    Ok(())
}
