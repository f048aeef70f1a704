//! Idempotent batch synchronization of approved expenses to the ledger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tripflow_core::{ExpenseId, LedgerLineId, TravelError, TravelResult};
use tripflow_travel::{ExpenseClaim, LedgerLine, TravelRequest};

use crate::gl::gl_account;
use crate::simulator::{FirstAttemptThreshold, SyncFailureSimulator};

/// A plan for one successful batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncBatch {
    pub batch_id: String,
    pub attempt: u32,
    pub total_minor: i64,
    pub expense_ids: Vec<ExpenseId>,
    pub lines: Vec<LedgerLine>,
}

/// Outcome of a sync invocation that passed the fail-fast checks.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncDecision {
    /// The simulated endpoint rejected the batch; the caller should record
    /// the failure and may retry.
    Failure { attempt: u32, error: String },
    /// The batch posts; the caller records lines and stamps the claims.
    Success(SyncBatch),
}

pub struct FinanceSyncEngine {
    simulator: Arc<dyn SyncFailureSimulator>,
}

impl FinanceSyncEngine {
    pub fn new(simulator: Arc<dyn SyncFailureSimulator>) -> Self {
        Self { simulator }
    }

    /// Decide what a sync invocation does to this request.
    ///
    /// Fail-fast outcomes are terminal errors: `no_expenses_to_sync` when no
    /// expense was ever approved, `already_synced` when every approved
    /// expense is already posted. Neither counts as an attempt.
    pub fn decide(&self, request: &TravelRequest, now: DateTime<Utc>) -> TravelResult<SyncDecision> {
        let approved: Vec<&ExpenseClaim> =
            request.expenses().iter().filter(|e| e.is_approved()).collect();
        if approved.is_empty() {
            return Err(TravelError::NoExpensesToSync);
        }

        let unsynced: Vec<&ExpenseClaim> =
            approved.iter().copied().filter(|e| e.synced_at.is_none()).collect();
        if unsynced.is_empty() {
            return Err(TravelError::AlreadySynced);
        }

        let attempt = request.finance_sync().attempts + 1;
        let total_minor: i64 = unsynced.iter().map(|e| e.amount.amount_minor).sum();

        if let Some(error) = self.simulator.should_fail(attempt, total_minor) {
            return Ok(SyncDecision::Failure { attempt, error });
        }

        let batch_id = Uuid::now_v7().to_string();
        let lines = unsynced
            .iter()
            .map(|claim| {
                let (gl_code, gl_name) = gl_account(claim.category);
                LedgerLine {
                    id: LedgerLineId::new(),
                    batch_id: batch_id.clone(),
                    expense_id: claim.id,
                    gl_code: gl_code.to_string(),
                    gl_name: gl_name.to_string(),
                    amount: claim.amount.clone(),
                    description: format!("{} ({})", claim.merchant, claim.category.as_str()),
                    posted_at: now,
                }
            })
            .collect();

        Ok(SyncDecision::Success(SyncBatch {
            batch_id,
            attempt,
            total_minor,
            expense_ids: unsynced.iter().map(|e| e.id).collect(),
            lines,
        }))
    }
}

impl Default for FinanceSyncEngine {
    fn default() -> Self {
        Self::new(Arc::new(FirstAttemptThreshold::default()))
    }
}
