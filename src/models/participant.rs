use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub email: String,
    pub is_owner: bool,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
}
