//! `tripflow-finance` — ledger posting for approved expenses.
//!
//! The engine is a pure decision function over a request: it never mutates
//! state. The orchestrator applies the returned decision to the aggregate.

pub mod engine;
pub mod gl;
pub mod simulator;

pub use engine::{FinanceSyncEngine, SyncBatch, SyncDecision};
pub use gl::gl_account;
pub use simulator::{
    FirstAttemptThreshold, NeverFail, SyncFailureSimulator, DEFAULT_FAILURE_THRESHOLD_MINOR,
};
