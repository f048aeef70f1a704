//! `tripflow-travel` — travel request domain model.
//!
//! Pure domain logic only: no IO, no locking, no clock reads. Time is always
//! passed in by the caller.

pub mod audit;
pub mod booking;
pub mod closure;
pub mod expense;
pub mod finance;
pub mod request;
pub mod route;
pub mod rules;
pub mod status;

pub use audit::{AuditAction, AuditEvent};
pub use booking::BookingRecord;
pub use closure::{ClosureCheck, ClosureCheckId, ClosureReadiness, ExpenseTotals, TripClosureRecord};
pub use expense::{ExpenseCategory, ExpenseClaim, ExpenseStatus, Receipt, MAX_RECEIPT_BYTES};
pub use finance::{FinanceSyncState, LedgerLine, SyncStatus};
pub use request::{RequesterProfile, TravelRequest, TripDetails};
pub use route::{ApprovalStep, StepKind, StepStatus};
pub use rules::{TransitionId, TransitionRule, RULES};
pub use status::{Actor, RequestStatus, TravelRole};
