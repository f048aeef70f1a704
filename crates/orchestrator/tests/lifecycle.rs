//! End-to-end lifecycle tests driven through the orchestrator surface.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use tripflow_core::{Clock, Currency, ManualClock, Money, RequestId, TransitionBlock};
use tripflow_finance::FinanceSyncEngine;
use tripflow_orchestrator::{
    BookingInput, CreateTravelRequest, ExpenseInput, InMemoryRequestRepository, ReceiptInput,
    ReviewDecision, TravelOrchestrator,
};
use tripflow_policy::{
    EmployeeGrade, FixedPolicyEvaluator, PolicyEvaluator, TravelClass, TravelPolicy, TripType,
};
use tripflow_travel::{
    Actor, ExpenseCategory, RequestStatus, StepKind, StepStatus, SyncStatus, TransitionId,
    TravelRole,
};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).single().unwrap()
}

struct Harness {
    flow: TravelOrchestrator,
    clock: Arc<ManualClock>,
}

fn harness_with(evaluator: Arc<dyn PolicyEvaluator>) -> Harness {
    tripflow_observability::init();
    let clock = Arc::new(ManualClock::new(start()));
    let flow = TravelOrchestrator::new(
        Arc::new(InMemoryRequestRepository::new()),
        evaluator,
        TravelPolicy::new("2025-07"),
        clock.clone(),
        FinanceSyncEngine::default(),
    );
    Harness { flow, clock }
}

fn harness() -> Harness {
    harness_with(Arc::new(FixedPolicyEvaluator::compliant()))
}

fn employee() -> Actor {
    Actor::new(TravelRole::Employee, "Eman")
}

fn manager() -> Actor {
    Actor::new(TravelRole::Manager, "Mona")
}

fn desk() -> Actor {
    Actor::new(TravelRole::TravelDesk, "Tariq")
}

fn finance() -> Actor {
    Actor::new(TravelRole::Finance, "Fahad")
}

fn sar(amount_minor: i64) -> Money {
    Money::new(amount_minor, Currency::new("SAR").unwrap())
}

fn create_input(now: chrono::DateTime<Utc>) -> CreateTravelRequest {
    CreateTravelRequest {
        employee_name: "Eman".to_string(),
        employee_grade: EmployeeGrade::Senior,
        department: "Engineering".to_string(),
        purpose: "Client workshop".to_string(),
        destination: "Jeddah".to_string(),
        trip_type: TripType::Domestic,
        departure_date: now + Duration::days(1),
        return_date: now + Duration::days(3),
        travel_class: TravelClass::Economy,
        estimated_cost: sar(200_000),
    }
}

fn expense_input(amount_minor: i64, date: NaiveDate) -> ExpenseInput {
    ExpenseInput {
        category: ExpenseCategory::Hotel,
        amount: sar(amount_minor),
        expense_date: date,
        merchant: "Hotel Azd".to_string(),
        description: "Two nights".to_string(),
        receipt: ReceiptInput {
            file_name: "hotel.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 64_000,
        },
    }
}

fn booking_input(booked_minor: i64) -> BookingInput {
    BookingInput {
        reference: "BK-2207".to_string(),
        carrier: Some("Saudia".to_string()),
        hotel: Some("Hotel Azd".to_string()),
        booked_cost: sar(booked_minor),
    }
}

/// Walk the approval chain up to `booked`.
fn drive_to_booked(h: &Harness) -> RequestId {
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();
    h.flow.apply_transition(&id, TransitionId::SubmitRequest, &employee(), None).unwrap();
    h.flow.apply_transition(&id, TransitionId::ManagerApprove, &manager(), None).unwrap();
    h.flow.apply_transition(&id, TransitionId::TravelDeskReview, &desk(), None).unwrap();
    h.flow.apply_transition(&id, TransitionId::FinanceApprove, &finance(), None).unwrap();
    h.flow.apply_transition(&id, TransitionId::ConfirmBooking, &desk(), None).unwrap();
    id
}

#[test]
fn each_transition_bumps_version_once_and_lands_on_the_rule_target() {
    let h = harness();
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();
    let mut version = request.version();

    let chain = [
        (TransitionId::SubmitRequest, employee(), RequestStatus::Submitted),
        (TransitionId::ManagerApprove, manager(), RequestStatus::ManagerApproved),
        (TransitionId::TravelDeskReview, desk(), RequestStatus::TravelReview),
        (TransitionId::FinanceApprove, finance(), RequestStatus::FinanceApproved),
        (TransitionId::ConfirmBooking, desk(), RequestStatus::Booked),
    ];
    for (transition, actor, expected) in chain {
        let outcome = h.flow.apply_transition(&id, transition, &actor, None).unwrap();
        assert_eq!(outcome.to, expected);
        assert_eq!(outcome.request.status(), expected);
        assert_eq!(outcome.request.version(), version + 1);
        assert_eq!(
            outcome.request.version(),
            outcome.request.audit_trail().len() as u64
        );
        version += 1;
    }
}

#[test]
fn sequential_request_ids() {
    let h = harness();
    let first = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let second = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    assert_eq!(first.id().as_str(), "TR-0001");
    assert_eq!(second.id().as_str(), "TR-0002");
}

#[test]
fn create_reports_the_first_invalid_field() {
    let h = harness();
    let mut input = create_input(h.clock.now());
    input.employee_name = "  ".to_string();
    input.destination = String::new();
    input.estimated_cost = sar(0);

    let err = h.flow.create(input, &employee()).unwrap_err();
    assert_eq!(err.code(), "validation_failed");
    assert!(err.to_string().contains("employee name"), "got: {err}");
}

#[test]
fn create_rejects_return_before_departure() {
    let h = harness();
    let mut input = create_input(h.clock.now());
    input.return_date = input.departure_date - Duration::days(1);
    let err = h.flow.create(input, &employee()).unwrap_err();
    assert!(err.to_string().contains("return date"), "got: {err}");
}

#[test]
fn unknown_request_id_is_not_found() {
    let h = harness();
    let err = h
        .flow
        .apply_transition(
            &RequestId::from_sequence(42),
            TransitionId::SubmitRequest,
            &employee(),
            None,
        )
        .unwrap_err();
    assert_eq!(err.code(), "request_not_found");
}

#[test]
fn blocked_policy_stops_submission() {
    let h = harness_with(Arc::new(FixedPolicyEvaluator::blocked(
        "cost_cap",
        "estimated cost exceeds grade cap",
    )));
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();

    let err = h
        .flow
        .apply_transition(&id, TransitionId::SubmitRequest, &employee(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::PolicyBlocked));
    assert_eq!(h.flow.get(&id).unwrap().status(), RequestStatus::Draft);
}

#[test]
fn state_gating_takes_precedence_over_role_gating() {
    let h = harness();
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();

    // Draft request, finance actor: manager_approve fails on state first.
    let err = h
        .flow
        .apply_transition(&id, TransitionId::ManagerApprove, &finance(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::StateNotAllowed));

    h.flow.apply_transition(&id, TransitionId::SubmitRequest, &employee(), None).unwrap();
    let err = h
        .flow
        .apply_transition(&id, TransitionId::ManagerApprove, &employee(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::RoleNotAllowed));
}

#[test]
fn rejection_requires_a_note_and_closes_the_route() {
    let h = harness();
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();
    h.flow.apply_transition(&id, TransitionId::SubmitRequest, &employee(), None).unwrap();

    let err = h
        .flow
        .apply_transition(&id, TransitionId::RejectRequest, &manager(), Some("  ".to_string()))
        .unwrap_err();
    assert_eq!(err.code(), "note_required");

    let outcome = h
        .flow
        .apply_transition(
            &id,
            TransitionId::RejectRequest,
            &manager(),
            Some("budget freeze this quarter".to_string()),
        )
        .unwrap();
    assert_eq!(outcome.to, RequestStatus::Rejected);

    let route = outcome.request.approval_route().to_vec();
    let manager_step = route.iter().find(|s| s.kind == StepKind::Manager).unwrap();
    assert_eq!(manager_step.status, StepStatus::Rejected);
    assert_eq!(manager_step.note.as_deref(), Some("budget freeze this quarter"));
    assert!(route
        .iter()
        .filter(|s| s.kind != StepKind::Manager)
        .all(|s| s.status == StepStatus::Skipped));
}

#[test]
fn cancellation_requires_a_note_and_terminal_states_stay_terminal() {
    let h = harness();
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();
    h.flow.apply_transition(&id, TransitionId::SubmitRequest, &employee(), None).unwrap();

    let err = h
        .flow
        .apply_transition(&id, TransitionId::CancelRequest, &employee(), None)
        .unwrap_err();
    assert_eq!(err.code(), "note_required");

    let outcome = h
        .flow
        .apply_transition(
            &id,
            TransitionId::CancelRequest,
            &employee(),
            Some("trip no longer needed".to_string()),
        )
        .unwrap();
    assert_eq!(outcome.to, RequestStatus::Cancelled);

    let err = h
        .flow
        .apply_transition(&id, TransitionId::SubmitRequest, &employee(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::StateNotAllowed));
}

#[test]
fn booking_is_gated_by_role_and_status() {
    let h = harness();
    let request = h.flow.create(create_input(h.clock.now()), &employee()).unwrap();
    let id = request.id().clone();

    let err = h.flow.upsert_booking(&id, booking_input(150_000), &employee()).unwrap_err();
    assert_eq!(err.code(), "role_not_allowed");

    let err = h.flow.upsert_booking(&id, booking_input(150_000), &desk()).unwrap_err();
    assert_eq!(err.code(), "invalid_state");

    let id = drive_to_booked(&h);
    let updated = h.flow.upsert_booking(&id, booking_input(150_000), &desk()).unwrap();
    let booking = updated.booking().unwrap();
    assert_eq!(booking.reference, "BK-2207");
    assert_eq!(booking.recorded_by, "Tariq");
}

#[test]
fn expense_submission_validations() {
    let h = harness();
    let id = drive_to_booked(&h);
    let today = h.clock.now().date_naive();

    let mut input = expense_input(120_000, today);
    input.amount = Money::new(120_000, Currency::new("USD").unwrap());
    let err = h.flow.submit_expense(&id, input, &employee()).unwrap_err();
    assert!(err.to_string().contains("currency"), "got: {err}");

    let input = expense_input(120_000, today + Duration::days(2));
    let err = h.flow.submit_expense(&id, input, &employee()).unwrap_err();
    assert!(err.to_string().contains("future"), "got: {err}");

    let mut input = expense_input(120_000, today);
    input.receipt.size_bytes = 6 * 1024 * 1024;
    let err = h.flow.submit_expense(&id, input, &employee()).unwrap_err();
    assert!(err.to_string().contains("5 MiB"), "got: {err}");

    let err = h
        .flow
        .submit_expense(&id, expense_input(120_000, today), &finance())
        .unwrap_err();
    assert_eq!(err.code(), "role_not_allowed");
}

#[test]
fn expense_rejection_requires_a_note() {
    let h = harness();
    let id = drive_to_booked(&h);
    let today = h.clock.now().date_naive();
    let submission = h
        .flow
        .submit_expense(&id, expense_input(30_000, today), &employee())
        .unwrap();

    let err = h
        .flow
        .review_expense(&id, submission.expense.id, ReviewDecision::Reject, &finance(), None)
        .unwrap_err();
    assert_eq!(err.code(), "note_required");

    let review = h
        .flow
        .review_expense(
            &id,
            submission.expense.id,
            ReviewDecision::Reject,
            &finance(),
            Some("missing receipt detail".to_string()),
        )
        .unwrap();
    assert_eq!(review.expense.review_note.as_deref(), Some("missing receipt detail"));
}

#[test]
fn finance_sync_is_idempotent() {
    let h = harness();
    let id = drive_to_booked(&h);
    let today = h.clock.now().date_naive();

    let submission = h
        .flow
        .submit_expense(&id, expense_input(120_000, today), &employee())
        .unwrap();
    h.flow
        .review_expense(&id, submission.expense.id, ReviewDecision::Approve, &finance(), None)
        .unwrap();

    let report = h.flow.sync_finance(&id, &finance()).unwrap();
    assert_eq!(report.ledger_lines.len(), 1);
    assert_eq!(report.ledger_lines[0].gl_code, "7002");
    assert_eq!(report.request.finance_sync().status, SyncStatus::Succeeded);

    // Re-invocation posts nothing and leaves the ledger untouched.
    let err = h.flow.sync_finance(&id, &finance()).unwrap_err();
    assert_eq!(err.code(), "already_synced");
    let request = h.flow.get(&id).unwrap();
    assert_eq!(request.finance_sync().ledger_lines.len(), 1);
    assert_eq!(request.finance_sync().attempts, 1);
}

#[test]
fn large_batch_fails_once_then_retry_converges() {
    let h = harness();
    let id = drive_to_booked(&h);
    h.flow.upsert_booking(&id, booking_input(560_000), &desk()).unwrap();
    let today = h.clock.now().date_naive();

    for amount in [300_000, 250_000] {
        let submission = h
            .flow
            .submit_expense(&id, expense_input(amount, today), &employee())
            .unwrap();
        h.flow
            .review_expense(&id, submission.expense.id, ReviewDecision::Approve, &finance(), None)
            .unwrap();
    }

    let err = h.flow.sync_finance(&id, &finance()).unwrap_err();
    assert_eq!(err.code(), "sync_failed");
    let request = h.flow.get(&id).unwrap();
    assert_eq!(request.finance_sync().status, SyncStatus::Failed);
    assert_eq!(request.finance_sync().attempts, 1);
    assert!(request.finance_sync().last_error.is_some());

    // While the last attempt stands failed, closure stays blocked.
    h.clock.advance(Duration::days(4));
    let err = h
        .flow
        .apply_transition(&id, TransitionId::CloseTrip, &finance(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::FinanceSyncIncomplete));

    let report = h.flow.sync_finance(&id, &finance()).unwrap();
    assert_eq!(report.ledger_lines.len(), 2);
    let request = h.flow.get(&id).unwrap();
    assert_eq!(request.finance_sync().status, SyncStatus::Succeeded);
    assert_eq!(request.finance_sync().attempts, 2);
}

#[test]
fn close_before_return_date_is_refused() {
    let h = harness();
    let id = drive_to_booked(&h);
    h.flow.upsert_booking(&id, booking_input(150_000), &desk()).unwrap();

    let readiness = h.flow.closure_readiness(&id).unwrap();
    assert!(!readiness.ready);
    assert!(
        !readiness
            .check(tripflow_travel::ClosureCheckId::TripCompleted)
            .unwrap()
            .passed
    );

    let err = h
        .flow
        .apply_transition(&id, TransitionId::CloseTrip, &finance(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::TripNotCompleted));
}

#[test]
fn pending_expense_blocks_closure_with_a_telling_message() {
    let h = harness();
    let id = drive_to_booked(&h);
    h.flow.upsert_booking(&id, booking_input(150_000), &desk()).unwrap();
    let today = h.clock.now().date_naive();
    h.flow
        .submit_expense(&id, expense_input(40_000, today), &employee())
        .unwrap();

    h.clock.advance(Duration::days(4));
    let err = h
        .flow
        .apply_transition(&id, TransitionId::CloseTrip, &finance(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::ExpensesPending));
    assert!(err.to_string().contains("pending expense"), "got: {err}");
}

#[test]
fn end_to_end_lifecycle_closes_with_variances() {
    let h = harness();
    let id = drive_to_booked(&h);
    h.flow.upsert_booking(&id, booking_input(150_000), &desk()).unwrap();

    // 1200.00 SAR hotel claim, approved and posted.
    let today = h.clock.now().date_naive();
    let submission = h
        .flow
        .submit_expense(&id, expense_input(120_000, today), &employee())
        .unwrap();
    h.flow
        .review_expense(&id, submission.expense.id, ReviewDecision::Approve, &finance(), None)
        .unwrap();
    let report = h.flow.sync_finance(&id, &finance()).unwrap();

    h.clock.advance(Duration::days(4));
    let readiness = h.flow.closure_readiness(&id).unwrap();
    assert!(readiness.ready);

    let outcome = h
        .flow
        .apply_transition(&id, TransitionId::CloseTrip, &finance(), Some("settled".to_string()))
        .unwrap();
    assert_eq!(outcome.to, RequestStatus::Closed);

    let closure = outcome.request.closure().unwrap();
    assert_eq!(closure.total_expenses, 1);
    assert_eq!(closure.total_approved_minor, 120_000);
    assert_eq!(closure.total_settled_minor, 120_000);
    assert_eq!(closure.variance_from_booked_minor, 120_000 - 150_000);
    assert_eq!(closure.variance_from_estimated_minor, 120_000 - 200_000);
    assert_eq!(closure.last_batch_id.as_deref(), Some(report.batch_id.as_str()));
    assert_eq!(closure.sync_attempts, 1);

    // The whole route is approved and the trail matches the version.
    assert!(outcome
        .request
        .approval_route()
        .iter()
        .all(|s| s.status == StepStatus::Approved));
    assert_eq!(
        outcome.request.version(),
        outcome.request.audit_trail().len() as u64
    );

    let err = h
        .flow
        .apply_transition(&id, TransitionId::CloseTrip, &finance(), None)
        .unwrap_err();
    assert_eq!(err.transition_block(), Some(TransitionBlock::StateNotAllowed));
}

#[test]
fn audit_export_covers_every_event_across_requests() {
    let h = harness();
    let id = drive_to_booked(&h);
    h.flow.create(create_input(h.clock.now()), &employee()).unwrap();

    let csv = h.flow.export_audit_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("request_id,event_id,at,"));

    let booked = h.flow.get(&id).unwrap();
    // One row per event of the driven request plus one creation row.
    assert_eq!(lines.len(), 1 + booked.audit_trail().len() + 1);
    assert!(lines[1].starts_with("TR-0001,"));
    assert!(lines.last().unwrap().starts_with("TR-0002,"));
    assert!(csv.contains(",submit_request,draft,submitted,"));
    assert!(csv.contains(",confirm_booking,finance_approved,booked,"));
}
