//! `tripflow-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;
pub mod money;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TransitionBlock, TravelError, TravelResult};
pub use id::{AuditEventId, ExpenseId, LedgerLineId, RequestId, StepId};
pub use money::{Currency, Money};
