//! `tripflow-orchestrator` — the travel request lifecycle store.
//!
//! The orchestrator composes the rule table, route propagator, finance sync
//! engine, and closure evaluator behind one surface; it is the only component
//! external callers invoke.

pub mod audit_csv;
pub mod orchestrator;
pub mod repo;

pub use orchestrator::{
    BookingInput, CreateTravelRequest, ExpenseInput, ExpenseReview, ExpenseSubmission,
    ReceiptInput, ReviewDecision, SyncReport, TransitionOutcome, TravelOrchestrator,
};
pub use repo::{InMemoryRequestRepository, TravelRequestRepository};
