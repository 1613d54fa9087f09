//! Alert domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use watchpost_core::{AlertId, AlertState, CameraId, PersonId};

/// A raised security event awaiting (or past) human acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Unique alert ID.
    pub id: AlertId,
    /// Matched person, if the producer identified one.
    pub person_id: Option<PersonId>,
    /// Camera feed that produced the event.
    pub camera_id: CameraId,
    /// When the producer raised the alert.
    pub triggered_at: DateTime<Utc>,
    /// `false` while raised, `true` once acknowledged. Never reverts.
    pub acknowledged: bool,
    /// When the alert was acknowledged.
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> AlertState {
        AlertState::from_acknowledged(self.acknowledged)
    }
}

/// Insert payload for the detection producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAlert {
    pub person_id: Option<PersonId>,
    pub camera_id: CameraId,
}
