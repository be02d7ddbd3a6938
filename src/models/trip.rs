use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::participant::Participant;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: String,
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Row data for a trip that has not been stored yet, together with the
/// participant that owns it.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub owner: NewParticipant,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub is_owner: bool,
    pub is_confirmed: bool,
}

impl NewParticipant {
    /// The participant created alongside a trip: owner and already confirmed.
    pub fn owner(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            is_owner: true,
            is_confirmed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDetails {
    #[serde(flatten)]
    pub trip: Trip,
    pub participants: Vec<Participant>,
}

impl TripDetails {
    pub fn owner(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_owner)
    }
}
