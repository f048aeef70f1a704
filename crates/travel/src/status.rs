use serde::{Deserialize, Serialize};

/// Travel request status lifecycle.
///
/// Transitions between statuses happen only through the rule table in
/// [`crate::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Submitted,
    ManagerApproved,
    TravelReview,
    FinanceApproved,
    Booked,
    Closed,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::ManagerApproved => "manager_approved",
            Self::TravelReview => "travel_review",
            Self::FinanceApproved => "finance_approved",
            Self::Booked => "booked",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Rejected | Self::Cancelled)
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actor roles authorized to drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelRole {
    Employee,
    Manager,
    TravelDesk,
    Finance,
    Admin,
}

impl TravelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::TravelDesk => "travel_desk",
            Self::Finance => "finance",
            Self::Admin => "admin",
        }
    }
}

impl core::fmt::Display for TravelRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: TravelRole,
    pub name: String,
}

impl Actor {
    pub fn new(role: TravelRole, name: impl Into<String>) -> Self {
        Self { role, name: name.into() }
    }
}
