use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::{ExpenseId, Money};

/// Receipt uploads are capped at 5 MiB.
pub const MAX_RECEIPT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Flight,
    Hotel,
    Meals,
    GroundTransport,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Meals => "meals",
            Self::GroundTransport => "ground_transport",
            Self::Other => "other",
        }
    }
}

/// Claim review lifecycle: submitted, then exactly one terminal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Submitted,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    pub id: ExpenseId,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub expense_date: NaiveDate,
    pub merchant: String,
    pub description: String,
    pub status: ExpenseStatus,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
    pub synced_batch_id: Option<String>,
    pub receipt: Receipt,
}

impl ExpenseClaim {
    pub fn is_pending(&self) -> bool {
        self.status == ExpenseStatus::Submitted
    }

    pub fn is_approved(&self) -> bool {
        self.status == ExpenseStatus::Approved
    }

    /// Approved but not yet posted to the ledger.
    pub fn needs_sync(&self) -> bool {
        self.is_approved() && self.synced_at.is_none()
    }
}
