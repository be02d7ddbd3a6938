use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::DbPool,
    models::{
        participant::Participant,
        trip::{NewTrip, Trip},
    },
};

/// Persistence for trips and the participants they own.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Stores the trip and its owner in one transaction and returns the new
    /// trip id. Either both rows exist afterwards or neither does.
    async fn create_with_owner(&self, trip: NewTrip) -> Result<String, sqlx::Error>;

    async fn find_trip(&self, trip_id: &str) -> Result<Option<Trip>, sqlx::Error>;

    async fn list_participants(&self, trip_id: &str) -> Result<Vec<Participant>, sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteTripStore {
    db: DbPool,
}

impl SqliteTripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TripStore for SqliteTripStore {
    async fn create_with_owner(&self, trip: NewTrip) -> Result<String, sqlx::Error> {
        let trip_id = Uuid::new_v4().to_string();
        let participant_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO trips (id, destination, starts_at, ends_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&trip_id)
        .bind(&trip.destination)
        .bind(trip.starts_at)
        .bind(trip.ends_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO participants (id, trip_id, name, email, is_owner, is_confirmed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&participant_id)
        .bind(&trip_id)
        .bind(&trip.owner.name)
        .bind(&trip.owner.email)
        .bind(trip.owner.is_owner)
        .bind(trip.owner.is_confirmed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(trip_id = %trip_id, participant_id = %participant_id, "trip stored");
        Ok(trip_id)
    }

    async fn find_trip(&self, trip_id: &str) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            "SELECT id, destination, starts_at, ends_at, created_at FROM trips WHERE id = ?",
        )
        .bind(trip_id)
        .fetch_optional(&self.db)
        .await
    }

    async fn list_participants(&self, trip_id: &str) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(
            "SELECT id, trip_id, name, email, is_owner, is_confirmed, created_at
             FROM participants WHERE trip_id = ? ORDER BY rowid",
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await
    }
}
