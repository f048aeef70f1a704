//! Finance synchronization state embedded in a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::{ExpenseId, LedgerLineId, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    NotSynced,
    Pending,
    Succeeded,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSynced => "not_synced",
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// One GL-postable record per synchronized expense claim.
///
/// Immutable once created; lines accumulate across batches and are never
/// removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: LedgerLineId,
    pub batch_id: String,
    pub expense_id: ExpenseId,
    pub gl_code: String,
    pub gl_name: String,
    pub amount: Money,
    pub description: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSyncState {
    pub status: SyncStatus,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_batch_id: Option<String>,
    pub ledger_lines: Vec<LedgerLine>,
}

impl FinanceSyncState {
    pub fn new() -> Self {
        Self {
            status: SyncStatus::NotSynced,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
            last_batch_id: None,
            ledger_lines: Vec::new(),
        }
    }
}

impl Default for FinanceSyncState {
    fn default() -> Self {
        Self::new()
    }
}
