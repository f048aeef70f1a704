//! Trip-closure readiness evaluation.
//!
//! A read-only projection over a request: five named checks plus aggregate
//! expense counts. The closure record written at actual closure reuses the
//! same evaluation and adds the cost variances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finance::SyncStatus;
use crate::request::TravelRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureCheckId {
    TripCompleted,
    BookingRecorded,
    ExpensesReviewed,
    ApprovedExpensesSynced,
    FinanceSyncNotFailed,
}

impl ClosureCheckId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TripCompleted => "trip_completed",
            Self::BookingRecorded => "booking_recorded",
            Self::ExpensesReviewed => "expenses_reviewed",
            Self::ApprovedExpensesSynced => "approved_expenses_synced",
            Self::FinanceSyncNotFailed => "finance_sync_not_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureCheck {
    pub id: ClosureCheckId,
    pub passed: bool,
    pub detail: String,
}

/// Aggregate expense counts and totals (minor units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseTotals {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
    pub approved_total_minor: i64,
    pub settled_total_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureReadiness {
    pub ready: bool,
    pub checks: Vec<ClosureCheck>,
    pub totals: ExpenseTotals,
}

impl ClosureReadiness {
    pub fn check(&self, id: ClosureCheckId) -> Option<&ClosureCheck> {
        self.checks.iter().find(|c| c.id == id)
    }
}

/// Immutable snapshot written exactly once on successful closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripClosureRecord {
    pub closed_at: DateTime<Utc>,
    pub total_expenses: usize,
    pub total_approved_minor: i64,
    pub total_settled_minor: i64,
    pub variance_from_booked_minor: i64,
    pub variance_from_estimated_minor: i64,
    pub last_batch_id: Option<String>,
    pub sync_attempts: u32,
    pub note: Option<String>,
}

fn totals(request: &TravelRequest) -> ExpenseTotals {
    let mut totals = ExpenseTotals {
        pending: 0,
        approved: 0,
        rejected: 0,
        total: 0,
        approved_total_minor: 0,
        settled_total_minor: 0,
    };
    for claim in request.expenses() {
        totals.total += 1;
        match claim.status {
            crate::expense::ExpenseStatus::Submitted => totals.pending += 1,
            crate::expense::ExpenseStatus::Approved => {
                totals.approved += 1;
                totals.approved_total_minor += claim.amount.amount_minor;
                if claim.synced_at.is_some() {
                    totals.settled_total_minor += claim.amount.amount_minor;
                }
            }
            crate::expense::ExpenseStatus::Rejected => totals.rejected += 1,
        }
    }
    totals
}

/// Evaluate the five closure checks. Never mutates state.
pub fn assess(request: &TravelRequest, now: DateTime<Utc>) -> ClosureReadiness {
    let totals = totals(request);
    let sync = request.finance_sync();

    let trip_completed = now >= request.trip().return_date;
    let booking_recorded = request.booking().is_some();
    let expenses_reviewed = totals.pending == 0;
    let approved_synced = !request.expenses().iter().any(|e| e.needs_sync());
    let sync_not_failed = !matches!(sync.status, SyncStatus::Failed | SyncStatus::Pending);

    let checks = vec![
        ClosureCheck {
            id: ClosureCheckId::TripCompleted,
            passed: trip_completed,
            detail: format!("return date {}", request.trip().return_date.to_rfc3339()),
        },
        ClosureCheck {
            id: ClosureCheckId::BookingRecorded,
            passed: booking_recorded,
            detail: match request.booking() {
                Some(b) => format!("booking reference {}", b.reference),
                None => "no booking recorded".to_string(),
            },
        },
        ClosureCheck {
            id: ClosureCheckId::ExpensesReviewed,
            passed: expenses_reviewed,
            detail: format!("{} claim(s) awaiting review", totals.pending),
        },
        ClosureCheck {
            id: ClosureCheckId::ApprovedExpensesSynced,
            passed: approved_synced,
            detail: format!(
                "{} approved claim(s) not yet posted",
                request.expenses().iter().filter(|e| e.needs_sync()).count()
            ),
        },
        ClosureCheck {
            id: ClosureCheckId::FinanceSyncNotFailed,
            passed: sync_not_failed,
            detail: format!("sync status {}", sync.status.as_str()),
        },
    ];

    ClosureReadiness {
        ready: checks.iter().all(|c| c.passed),
        checks,
        totals,
    }
}

/// Build the closure snapshot from the current readiness totals.
///
/// Variances are settled total minus booked cost and minus estimated cost.
pub fn build_record(
    request: &TravelRequest,
    now: DateTime<Utc>,
    note: Option<String>,
) -> TripClosureRecord {
    let readiness = assess(request, now);
    let settled = readiness.totals.settled_total_minor;
    let booked = request
        .booking()
        .map(|b| b.booked_cost.amount_minor)
        .unwrap_or(0);
    let estimated = request.trip().estimated_cost.amount_minor;

    TripClosureRecord {
        closed_at: now,
        total_expenses: readiness.totals.total,
        total_approved_minor: readiness.totals.approved_total_minor,
        total_settled_minor: settled,
        variance_from_booked_minor: settled - booked,
        variance_from_estimated_minor: settled - estimated,
        last_batch_id: request.finance_sync().last_batch_id.clone(),
        sync_attempts: request.finance_sync().attempts,
        note,
    }
}
