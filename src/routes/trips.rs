use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use lettre::Address;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{timestamp, trip::TripDetails},
    services::trips::CreateTrip,
    state::AppState,
};

const MIN_DESTINATION_LEN: usize = 4;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip))
        .route("/trips/:id", get(trip_detail))
}

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub destination: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub starts_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub ends_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_email: String,
}

impl CreateTripRequest {
    pub fn validate(self) -> Result<CreateTrip, AppError> {
        if self.destination.chars().count() < MIN_DESTINATION_LEN {
            return Err(AppError::BadRequest(format!(
                "destination must have at least {MIN_DESTINATION_LEN} characters"
            )));
        }
        let owner_email: Address = self
            .owner_email
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("owner_email must be a valid email".into()))?;

        Ok(CreateTrip {
            destination: self.destination,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            owner_name: self.owner_name,
            owner_email,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripResponse {
    pub trip_id: String,
}

async fn create_trip(
    State(state): State<AppState>,
    payload: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTripResponse>), AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let trip_id = state.trips.create(request.validate()?).await?;
    Ok((StatusCode::CREATED, Json(CreateTripResponse { trip_id })))
}

async fn trip_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TripDetails>, AppError> {
    let details = state.trips.get(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(details))
}
