use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripflow_core::Money;

/// Booking details recorded by the travel desk once the request is booked.
///
/// Updates replace the whole record (last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub reference: String,
    pub carrier: Option<String>,
    pub hotel: Option<String>,
    pub booked_cost: Money,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}
