//! `tripflow-policy` — the policy compliance boundary.
//!
//! Policy scoring itself is an external collaborator; this crate defines only
//! its input/output contract plus a deterministic stand-in for tests/dev.

pub mod evaluation;

pub use evaluation::{
    ComplianceLevel, EmployeeGrade, Finding, FixedPolicyEvaluator, PolicyEvaluation, PolicyEvaluator,
    PolicyInput, TravelClass, TravelPolicy, TripType,
};
