//! Identifiers and locally persisted records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identity of one risky-venue check-in
    CheckInId
);

string_id!(
    /// Venue the check-in was made at
    VenueId
);

string_id!(
    /// Token handed out by the decision endpoint for later resolution lookups
    ApprovalToken
);

/// A check-in flagged as risky, before the circuit breaker has been asked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyCheckIn {
    pub check_in_id: CheckInId,
    pub venue_id: VenueId,
}

impl RiskyCheckIn {
    pub fn new(check_in_id: impl Into<CheckInId>, venue_id: impl Into<VenueId>) -> Self {
        Self {
            check_in_id: check_in_id.into(),
            venue_id: venue_id.into(),
        }
    }
}

/// Outstanding circuit-breaker request awaiting a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingEntry {
    pub check_in_id: CheckInId,
    pub venue_id: VenueId,
    pub approval_token: ApprovalToken,
    /// When the initial request returned pending
    pub started_at: DateTime<Utc>,
}

/// Local state written once a venue alert has been approved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyVenueAlert {
    pub check_in_id: CheckInId,
    pub venue_id: VenueId,
    pub approved_at: DateTime<Utc>,
}

impl RiskyVenueAlert {
    /// Whether `other` describes the same alert, ignoring when it was approved
    pub fn same_alert(&self, other: &RiskyVenueAlert) -> bool {
        self.check_in_id == other.check_in_id && self.venue_id == other.venue_id
    }
}
