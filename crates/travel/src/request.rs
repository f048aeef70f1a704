//! The travel request aggregate root.
//!
//! All mutation goes through aggregate methods. Every mutator bumps `version`
//! by exactly one, refreshes `updated_at`, and appends exactly one audit
//! event, so the monotonic-version and append-only-audit invariants cannot be
//! violated from outside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::{ExpenseId, Money, RequestId, TravelError, TravelResult};
use tripflow_policy::{EmployeeGrade, PolicyEvaluation, PolicyInput, TravelClass, TripType};

use crate::audit::{AuditAction, AuditEvent};
use crate::booking::BookingRecord;
use crate::closure::TripClosureRecord;
use crate::expense::{ExpenseClaim, ExpenseStatus};
use crate::finance::{FinanceSyncState, LedgerLine, SyncStatus};
use crate::route::{self, ApprovalStep};
use crate::rules::TransitionRule;
use crate::status::{Actor, RequestStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequesterProfile {
    pub employee_name: String,
    pub employee_grade: EmployeeGrade,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub purpose: String,
    pub destination: String,
    pub trip_type: TripType,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub travel_class: TravelClass,
    pub estimated_cost: Money,
}

/// Aggregate root: TravelRequest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    id: RequestId,
    requester: RequesterProfile,
    trip: TripDetails,
    status: RequestStatus,
    approval_route: Vec<ApprovalStep>,
    policy_evaluation: PolicyEvaluation,
    booking: Option<BookingRecord>,
    expenses: Vec<ExpenseClaim>,
    finance_sync: FinanceSyncState,
    closure: Option<TripClosureRecord>,
    audit_trail: Vec<AuditEvent>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TravelRequest {
    /// Create a draft request with the fixed five-step route seeded.
    ///
    /// Creation is the first mutation: version 1, one audit event.
    pub fn create(
        id: RequestId,
        requester: RequesterProfile,
        trip: TripDetails,
        policy_evaluation: PolicyEvaluation,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Self {
        let event = AuditEvent::new(
            AuditAction::RequestCreated,
            actor,
            None,
            Some(RequestStatus::Draft),
            None,
            now,
        );
        Self {
            id,
            requester,
            trip,
            status: RequestStatus::Draft,
            approval_route: route::initial_route(),
            policy_evaluation,
            booking: None,
            expenses: Vec::new(),
            finance_sync: FinanceSyncState::new(),
            closure: None,
            audit_trail: vec![event],
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn requester(&self) -> &RequesterProfile {
        &self.requester
    }

    pub fn trip(&self) -> &TripDetails {
        &self.trip
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn approval_route(&self) -> &[ApprovalStep] {
        &self.approval_route
    }

    pub fn policy_evaluation(&self) -> &PolicyEvaluation {
        &self.policy_evaluation
    }

    pub fn booking(&self) -> Option<&BookingRecord> {
        self.booking.as_ref()
    }

    pub fn expenses(&self) -> &[ExpenseClaim] {
        &self.expenses
    }

    pub fn finance_sync(&self) -> &FinanceSyncState {
        &self.finance_sync
    }

    pub fn closure(&self) -> Option<&TripClosureRecord> {
        self.closure.as_ref()
    }

    pub fn audit_trail(&self) -> &[AuditEvent] {
        &self.audit_trail
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Attributes the policy evaluator scores.
    pub fn policy_input(&self) -> PolicyInput {
        PolicyInput {
            employee_grade: self.requester.employee_grade,
            trip_type: self.trip.trip_type,
            departure_date: self.trip.departure_date,
            return_date: self.trip.return_date,
            travel_class: self.trip.travel_class,
            estimated_cost: self.trip.estimated_cost.clone(),
        }
    }

    pub fn expense(&self, expense_id: ExpenseId) -> Option<&ExpenseClaim> {
        self.expenses.iter().find(|e| e.id == expense_id)
    }

    // ── mutators ────────────────────────────────────────────────────────────

    /// Apply an allowed transition: status, route, and (for submission and
    /// closure) the refreshed policy snapshot / the closure record.
    pub fn apply_transition(
        &mut self,
        rule: &TransitionRule,
        steps: Vec<ApprovalStep>,
        policy_evaluation: Option<PolicyEvaluation>,
        closure: Option<TripClosureRecord>,
        actor: &Actor,
        note: Option<String>,
        now: DateTime<Utc>,
    ) {
        let from = self.status;
        self.status = rule.to;
        self.approval_route = steps;
        if let Some(evaluation) = policy_evaluation {
            self.policy_evaluation = evaluation;
        }
        if let Some(record) = closure {
            self.closure = Some(record);
        }
        self.touch(
            AuditEvent::new(
                AuditAction::Transition(rule.id),
                actor,
                Some(from),
                Some(rule.to),
                note,
                now,
            ),
            now,
        );
    }

    /// Replace the booking record wholesale (last write wins).
    pub fn upsert_booking(&mut self, booking: BookingRecord, actor: &Actor, now: DateTime<Utc>) {
        self.booking = Some(booking);
        self.touch(
            AuditEvent::new(
                AuditAction::BookingUpdated,
                actor,
                Some(self.status),
                Some(self.status),
                None,
                now,
            ),
            now,
        );
    }

    /// Attach a freshly submitted claim.
    ///
    /// A new unsynced expense invalidates any "fully synced" state, but
    /// previously posted ledger lines stay put.
    pub fn add_expense(&mut self, claim: ExpenseClaim, actor: &Actor, now: DateTime<Utc>) {
        self.expenses.push(claim);
        self.finance_sync.status = SyncStatus::NotSynced;
        self.touch(
            AuditEvent::new(
                AuditAction::ExpenseSubmitted,
                actor,
                Some(self.status),
                Some(self.status),
                None,
                now,
            ),
            now,
        );
    }

    /// Approve a pending claim. Clears any stale sync stamp so the claim is
    /// picked up by the next finance batch.
    pub fn approve_expense(
        &mut self,
        expense_id: ExpenseId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> TravelResult<()> {
        let claim = self.reviewable_expense(expense_id)?;
        claim.status = ExpenseStatus::Approved;
        claim.reviewed_by = Some(actor.name.clone());
        claim.reviewed_at = Some(now);
        claim.review_note = None;
        claim.synced_at = None;
        claim.synced_batch_id = None;
        self.touch(
            AuditEvent::new(
                AuditAction::ExpenseApproved,
                actor,
                Some(self.status),
                Some(self.status),
                None,
                now,
            ),
            now,
        );
        Ok(())
    }

    /// Reject a pending claim. Rejected claims leave every future closure and
    /// sync consideration; re-approval is not permitted.
    pub fn reject_expense(
        &mut self,
        expense_id: ExpenseId,
        actor: &Actor,
        note: String,
        now: DateTime<Utc>,
    ) -> TravelResult<()> {
        let claim = self.reviewable_expense(expense_id)?;
        claim.status = ExpenseStatus::Rejected;
        claim.reviewed_by = Some(actor.name.clone());
        claim.reviewed_at = Some(now);
        claim.review_note = Some(note.clone());
        self.touch(
            AuditEvent::new(
                AuditAction::ExpenseRejected,
                actor,
                Some(self.status),
                Some(self.status),
                Some(note),
                now,
            ),
            now,
        );
        Ok(())
    }

    /// Record a failed sync attempt. No expense is marked synced.
    pub fn record_sync_failure(&mut self, error: String, actor: &Actor, now: DateTime<Utc>) {
        self.finance_sync.attempts += 1;
        self.finance_sync.last_attempt_at = Some(now);
        self.finance_sync.status = SyncStatus::Failed;
        self.finance_sync.last_error = Some(error.clone());
        self.touch(
            AuditEvent::new(
                AuditAction::FinanceSyncFailed,
                actor,
                Some(self.status),
                Some(self.status),
                Some(error),
                now,
            ),
            now,
        );
    }

    /// Record a successful batch: append ledger lines, stamp the synced
    /// claims, mark the state succeeded.
    pub fn record_sync_success(
        &mut self,
        batch_id: String,
        lines: Vec<LedgerLine>,
        synced: &[ExpenseId],
        actor: &Actor,
        now: DateTime<Utc>,
    ) {
        self.finance_sync.attempts += 1;
        self.finance_sync.last_attempt_at = Some(now);
        self.finance_sync.status = SyncStatus::Succeeded;
        self.finance_sync.last_error = None;
        self.finance_sync.last_batch_id = Some(batch_id.clone());
        self.finance_sync.ledger_lines.extend(lines);
        for claim in &mut self.expenses {
            if synced.contains(&claim.id) {
                claim.synced_at = Some(now);
                claim.synced_batch_id = Some(batch_id.clone());
            }
        }
        self.touch(
            AuditEvent::new(
                AuditAction::FinanceSyncSucceeded,
                actor,
                Some(self.status),
                Some(self.status),
                Some(batch_id),
                now,
            ),
            now,
        );
    }

    fn reviewable_expense(&mut self, expense_id: ExpenseId) -> TravelResult<&mut ExpenseClaim> {
        let claim = self
            .expenses
            .iter_mut()
            .find(|e| e.id == expense_id)
            .ok_or_else(|| TravelError::ExpenseNotFound(expense_id.to_string()))?;
        if claim.status != ExpenseStatus::Submitted {
            return Err(TravelError::ExpenseNotPending(expense_id.to_string()));
        }
        Ok(claim)
    }

    fn touch(&mut self, event: AuditEvent, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
        self.audit_trail.push(event);
    }
}
