use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tripflow_core::Money;

/// Compliance verdict, both for a whole evaluation and per finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    Compliant,
    Warning,
    Blocked,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Warning => "warning",
            Self::Blocked => "blocked",
        }
    }
}

/// Grade band of the requesting employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeGrade {
    Junior,
    Senior,
    Lead,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Domestic,
    International,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelClass {
    Economy,
    Business,
    First,
}

/// One policy rule outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub code: String,
    pub level: ComplianceLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

/// Snapshot of the latest policy verdict for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    pub policy_version: String,
    pub level: ComplianceLevel,
    pub findings: Vec<Finding>,
    pub evaluated_at: DateTime<Utc>,
}

impl PolicyEvaluation {
    pub fn is_blocked(&self) -> bool {
        self.level == ComplianceLevel::Blocked
    }
}

/// The currently active travel policy.
///
/// Parameters are opaque to this system; only the evaluator interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPolicy {
    pub version: String,
    #[serde(default)]
    pub parameters: JsonValue,
}

impl TravelPolicy {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), parameters: JsonValue::Null }
    }

    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Request attributes the evaluator scores against the active policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub employee_grade: EmployeeGrade,
    pub trip_type: TripType,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub travel_class: TravelClass,
    pub estimated_cost: Money,
}

/// External policy scoring, consumed as a pure function.
pub trait PolicyEvaluator: Send + Sync {
    fn evaluate(
        &self,
        input: &PolicyInput,
        policy: &TravelPolicy,
        now: DateTime<Utc>,
    ) -> PolicyEvaluation;
}

/// Deterministic evaluator returning a fixed verdict.
///
/// Intended for tests/dev; production wires a real evaluator behind the trait.
#[derive(Debug, Clone)]
pub struct FixedPolicyEvaluator {
    level: ComplianceLevel,
    findings: Vec<Finding>,
}

impl FixedPolicyEvaluator {
    pub fn compliant() -> Self {
        Self { level: ComplianceLevel::Compliant, findings: Vec::new() }
    }

    pub fn blocked(code: impl Into<String>, message: impl Into<String>) -> Self {
        let finding = Finding {
            code: code.into(),
            level: ComplianceLevel::Blocked,
            message: message.into(),
            context: None,
        };
        Self { level: ComplianceLevel::Blocked, findings: vec![finding] }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        let finding = Finding {
            code: code.into(),
            level: ComplianceLevel::Warning,
            message: message.into(),
            context: None,
        };
        Self { level: ComplianceLevel::Warning, findings: vec![finding] }
    }
}

impl PolicyEvaluator for FixedPolicyEvaluator {
    fn evaluate(
        &self,
        _input: &PolicyInput,
        policy: &TravelPolicy,
        now: DateTime<Utc>,
    ) -> PolicyEvaluation {
        PolicyEvaluation {
            policy_version: policy.version.clone(),
            level: self.level,
            findings: self.findings.clone(),
            evaluated_at: now,
        }
    }
}
