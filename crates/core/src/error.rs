//! Domain error model.
//!
//! Every expected business-rule violation is a `TravelError` value. Each
//! variant carries a human-readable message via `Display` and a stable
//! machine-checkable code via [`TravelError::code`]. Nothing here panics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type TravelResult<T> = Result<T, TravelError>;

/// Precedence-ordered reason a status transition was refused.
///
/// Exactly one reason is reported per refusal: the first check that failed.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionBlock {
    #[error("current status does not permit this transition")]
    StateNotAllowed,

    #[error("actor role is not authorized for this transition")]
    RoleNotAllowed,

    #[error("policy evaluation blocks submission")]
    PolicyBlocked,

    #[error("trip return date has not been reached")]
    TripNotCompleted,

    #[error("no booking has been recorded")]
    BookingNotRecorded,

    #[error("a pending expense is awaiting review")]
    ExpensesPending,

    #[error("approved expenses are not fully synced to finance")]
    FinanceSyncIncomplete,
}

impl TransitionBlock {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StateNotAllowed => "state_not_allowed",
            Self::RoleNotAllowed => "role_not_allowed",
            Self::PolicyBlocked => "policy_blocked",
            Self::TripNotCompleted => "trip_not_completed",
            Self::BookingNotRecorded => "booking_not_recorded",
            Self::ExpensesPending => "expenses_pending",
            Self::FinanceSyncIncomplete => "finance_sync_incomplete",
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation, state
/// gating, sync outcomes). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TravelError {
    /// A field failed validation (first violation found wins).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No travel request exists under the given id.
    #[error("travel request not found: {0}")]
    RequestNotFound(String),

    /// The actor's role does not permit the attempted operation.
    #[error("role not allowed: {0}")]
    RoleNotAllowed(String),

    /// A status transition was refused; the reason explains which check failed.
    #[error("transition not allowed: {0}")]
    TransitionNotAllowed(TransitionBlock),

    /// The operation requires an explanatory note and none was supplied.
    #[error("a note is required for this action")]
    NoteRequired,

    /// The request is not in a status that permits the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No expense claim exists under the given id.
    #[error("expense claim not found: {0}")]
    ExpenseNotFound(String),

    /// The expense claim has already been reviewed.
    #[error("expense claim is not pending review: {0}")]
    ExpenseNotPending(String),

    /// Finance sync was invoked with zero approved expenses.
    #[error("no approved expenses to sync")]
    NoExpensesToSync,

    /// Every approved expense has already been posted to the ledger.
    #[error("approved expenses are already synced")]
    AlreadySynced,

    /// The finance endpoint rejected the batch; the caller may retry.
    #[error("finance sync failed: {0}")]
    SyncFailed(String),

    /// Optimistic concurrency check failed (stale expected version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl TravelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn request_not_found(id: impl Into<String>) -> Self {
        Self::RequestNotFound(id.into())
    }

    pub fn role_not_allowed(msg: impl Into<String>) -> Self {
        Self::RoleNotAllowed(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-checkable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::RequestNotFound(_) => "request_not_found",
            Self::RoleNotAllowed(_) => "role_not_allowed",
            Self::TransitionNotAllowed(_) => "transition_not_allowed",
            Self::NoteRequired => "note_required",
            Self::InvalidState(_) => "invalid_state",
            Self::ExpenseNotFound(_) => "expense_not_found",
            Self::ExpenseNotPending(_) => "expense_not_pending",
            Self::NoExpensesToSync => "no_expenses_to_sync",
            Self::AlreadySynced => "already_synced",
            Self::SyncFailed(_) => "sync_failed",
            Self::Conflict(_) => "conflict",
        }
    }

    /// The blocking reason, when this error wraps a refused transition.
    pub fn transition_block(&self) -> Option<TransitionBlock> {
        match self {
            Self::TransitionNotAllowed(block) => Some(*block),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(TravelError::NoteRequired.code(), "note_required");
        assert_eq!(TravelError::AlreadySynced.code(), "already_synced");
        assert_eq!(
            TravelError::TransitionNotAllowed(TransitionBlock::PolicyBlocked).code(),
            "transition_not_allowed"
        );
        assert_eq!(TransitionBlock::FinanceSyncIncomplete.code(), "finance_sync_incomplete");
    }

    #[test]
    fn pending_expense_block_mentions_pending_expense() {
        let msg = TravelError::TransitionNotAllowed(TransitionBlock::ExpensesPending).to_string();
        assert!(msg.contains("pending expense"), "got: {msg}");
    }
}
