//! The lifecycle orchestrator.
//!
//! Every public operation follows the same shape: load the request, run the
//! pure domain checks, apply exactly one aggregate mutation, persist with the
//! loaded version as the optimistic-concurrency expectation. No mutation
//! happens before the first failing check.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use tripflow_core::{Clock, ExpenseId, Money, RequestId, TravelError, TravelResult, TransitionBlock};
use tripflow_finance::{FinanceSyncEngine, SyncDecision};
use tripflow_policy::{
    EmployeeGrade, PolicyEvaluator, PolicyInput, TravelClass, TravelPolicy, TripType,
};
use tripflow_travel::closure::{self, ClosureCheckId, ClosureReadiness};
use tripflow_travel::rules::{self, TransitionId};
use tripflow_travel::{
    route, Actor, BookingRecord, ExpenseCategory, ExpenseClaim, ExpenseStatus, LedgerLine,
    Receipt, RequesterProfile, RequestStatus, TravelRequest, TravelRole, TripDetails,
    MAX_RECEIPT_BYTES,
};

use crate::audit_csv;
use crate::repo::TravelRequestRepository;

/// Fields required to open a draft request.
#[derive(Debug, Clone)]
pub struct CreateTravelRequest {
    pub employee_name: String,
    pub employee_grade: EmployeeGrade,
    pub department: String,
    pub purpose: String,
    pub destination: String,
    pub trip_type: TripType,
    pub departure_date: chrono::DateTime<chrono::Utc>,
    pub return_date: chrono::DateTime<chrono::Utc>,
    pub travel_class: TravelClass,
    pub estimated_cost: Money,
}

#[derive(Debug, Clone)]
pub struct BookingInput {
    pub reference: String,
    pub carrier: Option<String>,
    pub hotel: Option<String>,
    pub booked_cost: Money,
}

#[derive(Debug, Clone)]
pub struct ReceiptInput {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub category: ExpenseCategory,
    pub amount: Money,
    pub expense_date: NaiveDate,
    pub merchant: String,
    pub description: String,
    pub receipt: ReceiptInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: TravelRequest,
    pub from: RequestStatus,
    pub to: RequestStatus,
}

#[derive(Debug, Clone)]
pub struct ExpenseSubmission {
    pub request: TravelRequest,
    pub expense: ExpenseClaim,
}

#[derive(Debug, Clone)]
pub struct ExpenseReview {
    pub request: TravelRequest,
    pub expense: ExpenseClaim,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub request: TravelRequest,
    pub batch_id: String,
    pub ledger_lines: Vec<LedgerLine>,
}

pub struct TravelOrchestrator {
    repo: Arc<dyn TravelRequestRepository>,
    policy_evaluator: Arc<dyn PolicyEvaluator>,
    active_policy: TravelPolicy,
    clock: Arc<dyn Clock>,
    sync_engine: FinanceSyncEngine,
    next_seq: AtomicU64,
}

impl TravelOrchestrator {
    pub fn new(
        repo: Arc<dyn TravelRequestRepository>,
        policy_evaluator: Arc<dyn PolicyEvaluator>,
        active_policy: TravelPolicy,
        clock: Arc<dyn Clock>,
        sync_engine: FinanceSyncEngine,
    ) -> Self {
        Self {
            repo,
            policy_evaluator,
            active_policy,
            clock,
            sync_engine,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Open a draft request: validate fields (first violation wins), compute
    /// the initial policy snapshot, seed the approval route.
    pub fn create(&self, input: CreateTravelRequest, actor: &Actor) -> TravelResult<TravelRequest> {
        let now = self.clock.now();

        if input.employee_name.trim().is_empty() {
            return Err(TravelError::validation("employee name must not be empty"));
        }
        if input.purpose.trim().is_empty() {
            return Err(TravelError::validation("trip purpose must not be empty"));
        }
        if input.destination.trim().is_empty() {
            return Err(TravelError::validation("destination must not be empty"));
        }
        if input.return_date < input.departure_date {
            return Err(TravelError::validation(
                "return date must not precede departure date",
            ));
        }
        if !input.estimated_cost.is_positive() {
            return Err(TravelError::validation("estimated cost must be positive"));
        }

        let requester = RequesterProfile {
            employee_name: input.employee_name,
            employee_grade: input.employee_grade,
            department: input.department,
        };
        let trip = TripDetails {
            purpose: input.purpose,
            destination: input.destination,
            trip_type: input.trip_type,
            departure_date: input.departure_date,
            return_date: input.return_date,
            travel_class: input.travel_class,
            estimated_cost: input.estimated_cost,
        };
        let policy_input = PolicyInput {
            employee_grade: requester.employee_grade,
            trip_type: trip.trip_type,
            departure_date: trip.departure_date,
            return_date: trip.return_date,
            travel_class: trip.travel_class,
            estimated_cost: trip.estimated_cost.clone(),
        };
        let evaluation = self
            .policy_evaluator
            .evaluate(&policy_input, &self.active_policy, now);

        let id = RequestId::from_sequence(self.next_seq.fetch_add(1, Ordering::SeqCst));
        let request = TravelRequest::create(id.clone(), requester, trip, evaluation, actor, now);
        self.repo.insert(request.clone())?;

        info!(request_id = %id, destination = %request.trip().destination, "travel request created");
        Ok(request)
    }

    /// Apply a table-defined transition.
    ///
    /// Submission re-evaluates policy against the currently active policy and
    /// the live request attributes before rule evaluation; closure re-checks
    /// full readiness and attaches the immutable closure record.
    pub fn apply_transition(
        &self,
        request_id: &RequestId,
        transition: TransitionId,
        actor: &Actor,
        note: Option<String>,
    ) -> TravelResult<TransitionOutcome> {
        let now = self.clock.now();
        let mut request = self.repo.get(request_id)?;
        let rule = rules::rule(transition);

        let fresh_policy = (transition == TransitionId::SubmitRequest).then(|| {
            self.policy_evaluator
                .evaluate(&request.policy_input(), &self.active_policy, now)
        });
        let policy_level = fresh_policy
            .as_ref()
            .map(|e| e.level)
            .unwrap_or(request.policy_evaluation().level);

        rules::evaluate(rule, &request, actor.role, policy_level, now)
            .map_err(TravelError::TransitionNotAllowed)?;

        if rule.requires_note && note.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(TravelError::NoteRequired);
        }

        let closure_record = if transition == TransitionId::CloseTrip {
            let readiness = closure::assess(&request, now);
            if let Some(failed) = readiness.checks.iter().find(|c| !c.passed) {
                return Err(TravelError::TransitionNotAllowed(block_for(failed.id)));
            }
            Some(closure::build_record(&request, now, note.clone()))
        } else {
            None
        };

        let steps = route::propagate(request.approval_route(), transition, actor, now, note.as_deref());
        let from = request.status();
        let expected = request.version();
        request.apply_transition(rule, steps, fresh_policy, closure_record, actor, note, now);
        self.repo.save(&request, expected)?;

        info!(
            request_id = %request_id,
            transition = transition.as_str(),
            from = from.as_str(),
            to = request.status().as_str(),
            "transition applied"
        );
        Ok(TransitionOutcome { from, to: request.status(), request })
    }

    /// Record or replace the booking (travel desk/admin, booked status only).
    pub fn upsert_booking(
        &self,
        request_id: &RequestId,
        input: BookingInput,
        actor: &Actor,
    ) -> TravelResult<TravelRequest> {
        let now = self.clock.now();
        ensure_role(actor, &[TravelRole::TravelDesk, TravelRole::Admin])?;
        let mut request = self.repo.get(request_id)?;

        if request.status() != RequestStatus::Booked {
            return Err(TravelError::invalid_state(format!(
                "booking can only be recorded for a booked request, current status is {}",
                request.status()
            )));
        }
        if input.reference.trim().is_empty() {
            return Err(TravelError::validation("booking reference must not be empty"));
        }
        if !input.booked_cost.is_positive() {
            return Err(TravelError::validation("booked cost must be positive"));
        }

        let booking = BookingRecord {
            reference: input.reference,
            carrier: input.carrier,
            hotel: input.hotel,
            booked_cost: input.booked_cost,
            recorded_by: actor.name.clone(),
            recorded_at: now,
        };
        let expected = request.version();
        request.upsert_booking(booking, actor, now);
        self.repo.save(&request, expected)?;

        info!(request_id = %request_id, "booking recorded");
        Ok(request)
    }

    /// Submit an expense claim against a booked request (employee/admin).
    pub fn submit_expense(
        &self,
        request_id: &RequestId,
        input: ExpenseInput,
        actor: &Actor,
    ) -> TravelResult<ExpenseSubmission> {
        let now = self.clock.now();
        ensure_role(actor, &[TravelRole::Employee, TravelRole::Admin])?;
        let mut request = self.repo.get(request_id)?;

        if request.status() != RequestStatus::Booked {
            return Err(TravelError::invalid_state(format!(
                "expenses can only be submitted against a booked request, current status is {}",
                request.status()
            )));
        }
        if !input.amount.is_positive() {
            return Err(TravelError::validation("expense amount must be positive"));
        }
        if input.amount.currency != request.trip().estimated_cost.currency {
            return Err(TravelError::validation(format!(
                "expense currency {} does not match request currency {}",
                input.amount.currency,
                request.trip().estimated_cost.currency
            )));
        }
        if input.expense_date > now.date_naive() {
            return Err(TravelError::validation("expense date must not be in the future"));
        }
        if input.receipt.file_name.trim().is_empty() {
            return Err(TravelError::validation("receipt file name must not be empty"));
        }
        if input.receipt.size_bytes > MAX_RECEIPT_BYTES {
            return Err(TravelError::validation("receipt exceeds the 5 MiB size limit"));
        }

        let claim = ExpenseClaim {
            id: ExpenseId::new(),
            category: input.category,
            amount: input.amount,
            expense_date: input.expense_date,
            merchant: input.merchant,
            description: input.description,
            status: ExpenseStatus::Submitted,
            submitted_by: actor.name.clone(),
            submitted_at: now,
            reviewed_by: None,
            reviewed_at: None,
            review_note: None,
            synced_at: None,
            synced_batch_id: None,
            receipt: Receipt {
                file_name: input.receipt.file_name,
                mime_type: input.receipt.mime_type,
                size_bytes: input.receipt.size_bytes,
                uploaded_at: now,
            },
        };
        let expense = claim.clone();
        let expected = request.version();
        request.add_expense(claim, actor, now);
        self.repo.save(&request, expected)?;

        info!(request_id = %request_id, expense_id = %expense.id, "expense submitted");
        Ok(ExpenseSubmission { request, expense })
    }

    /// Review a pending claim (finance/admin). Rejection requires a note.
    pub fn review_expense(
        &self,
        request_id: &RequestId,
        expense_id: ExpenseId,
        decision: ReviewDecision,
        actor: &Actor,
        note: Option<String>,
    ) -> TravelResult<ExpenseReview> {
        let now = self.clock.now();
        ensure_role(actor, &[TravelRole::Finance, TravelRole::Admin])?;
        let mut request = self.repo.get(request_id)?;
        let expected = request.version();

        match decision {
            ReviewDecision::Approve => request.approve_expense(expense_id, actor, now)?,
            ReviewDecision::Reject => {
                let note = note
                    .filter(|n| !n.trim().is_empty())
                    .ok_or(TravelError::NoteRequired)?;
                request.reject_expense(expense_id, actor, note, now)?;
            }
        }
        self.repo.save(&request, expected)?;

        let expense = request
            .expense(expense_id)
            .cloned()
            .ok_or_else(|| TravelError::ExpenseNotFound(expense_id.to_string()))?;
        info!(request_id = %request_id, expense_id = %expense_id, status = ?expense.status, "expense reviewed");
        Ok(ExpenseReview { request, expense })
    }

    /// Post all approved-but-unsynced expenses as one ledger batch
    /// (finance/admin). Retry after `sync_failed` is caller-driven.
    pub fn sync_finance(&self, request_id: &RequestId, actor: &Actor) -> TravelResult<SyncReport> {
        let now = self.clock.now();
        ensure_role(actor, &[TravelRole::Finance, TravelRole::Admin])?;
        let mut request = self.repo.get(request_id)?;
        let expected = request.version();

        match self.sync_engine.decide(&request, now)? {
            SyncDecision::Failure { attempt, error } => {
                request.record_sync_failure(error.clone(), actor, now);
                self.repo.save(&request, expected)?;
                warn!(request_id = %request_id, attempt, error = %error, "finance sync failed");
                Err(TravelError::SyncFailed(error))
            }
            SyncDecision::Success(batch) => {
                request.record_sync_success(
                    batch.batch_id.clone(),
                    batch.lines.clone(),
                    &batch.expense_ids,
                    actor,
                    now,
                );
                self.repo.save(&request, expected)?;
                info!(
                    request_id = %request_id,
                    batch_id = %batch.batch_id,
                    lines = batch.lines.len(),
                    total_minor = batch.total_minor,
                    "finance sync succeeded"
                );
                Ok(SyncReport {
                    request,
                    batch_id: batch.batch_id,
                    ledger_lines: batch.lines,
                })
            }
        }
    }

    /// Read-only closure readiness projection; never mutates state.
    pub fn closure_readiness(&self, request_id: &RequestId) -> TravelResult<ClosureReadiness> {
        let request = self.repo.get(request_id)?;
        let readiness = closure::assess(&request, self.clock.now());
        debug!(request_id = %request_id, ready = readiness.ready, "closure readiness assessed");
        Ok(readiness)
    }

    pub fn get(&self, request_id: &RequestId) -> TravelResult<TravelRequest> {
        self.repo.get(request_id)
    }

    pub fn list_requests(&self) -> TravelResult<Vec<TravelRequest>> {
        self.repo.list()
    }

    /// One CSV row per audit event across all requests.
    pub fn export_audit_csv(&self) -> TravelResult<String> {
        let requests = self.repo.list()?;
        Ok(audit_csv::export(&requests))
    }
}

fn ensure_role(actor: &Actor, allowed: &[TravelRole]) -> TravelResult<()> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(TravelError::role_not_allowed(format!(
            "role {} may not perform this operation",
            actor.role
        )))
    }
}

fn block_for(check: ClosureCheckId) -> TransitionBlock {
    match check {
        ClosureCheckId::TripCompleted => TransitionBlock::TripNotCompleted,
        ClosureCheckId::BookingRecorded => TransitionBlock::BookingNotRecorded,
        ClosureCheckId::ExpensesReviewed => TransitionBlock::ExpensesPending,
        ClosureCheckId::ApprovedExpensesSynced | ClosureCheckId::FinanceSyncNotFailed => {
            TransitionBlock::FinanceSyncIncomplete
        }
    }
}
