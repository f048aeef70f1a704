//! Transient-failure simulation for the ledger endpoint.
//!
//! Pluggable so real deployments can swap in an actual external client while
//! tests keep the deterministic rule.

/// Batches at or above 5,000.00 SAR fail on the first attempt.
pub const DEFAULT_FAILURE_THRESHOLD_MINOR: i64 = 500_000;

pub trait SyncFailureSimulator: Send + Sync {
    /// Returns the failure message when this attempt should fail.
    fn should_fail(&self, attempt: u32, batch_total_minor: i64) -> Option<String>;
}

/// Deterministic transient failure: the very first attempt fails when the
/// batch total reaches the threshold; any later attempt goes through.
#[derive(Debug, Clone, Copy)]
pub struct FirstAttemptThreshold {
    threshold_minor: i64,
}

impl FirstAttemptThreshold {
    pub fn new(threshold_minor: i64) -> Self {
        Self { threshold_minor }
    }
}

impl Default for FirstAttemptThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD_MINOR)
    }
}

impl SyncFailureSimulator for FirstAttemptThreshold {
    fn should_fail(&self, attempt: u32, batch_total_minor: i64) -> Option<String> {
        if attempt == 1 && batch_total_minor >= self.threshold_minor {
            Some(format!(
                "ledger endpoint rejected first attempt for batch total {batch_total_minor} minor units"
            ))
        } else {
            None
        }
    }
}

/// No simulated failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFail;

impl SyncFailureSimulator for NeverFail {
    fn should_fail(&self, _attempt: u32, _batch_total_minor: i64) -> Option<String> {
        None
    }
}
