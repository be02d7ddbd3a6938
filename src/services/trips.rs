use std::sync::Arc;

use askama::Template;
use chrono::{DateTime, Utc};
use lettre::{message::Mailbox, Address};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::trip::{NewParticipant, NewTrip, TripDetails},
    services::{
        mailer::{MailError, Mailer, OutgoingMail},
        trip_store::TripStore,
    },
};

const DATE_FORMAT: &str = "%B %-d, %Y";

#[derive(Debug, Error)]
pub enum TripError {
    #[error("Invalid trip start date.")]
    InvalidStartDate,
    #[error("Invalid trip end date.")]
    InvalidEndDate,
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}

/// Input for a new trip. Shape checks (destination length, email syntax)
/// have already happened by the time one of these exists.
#[derive(Debug, Clone)]
pub struct CreateTrip {
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_email: Address,
}

/// A trip may start right now and may end the moment it starts; only
/// strictly earlier instants are rejected. The start is checked first.
pub fn validate_dates(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TripError> {
    if starts_at < now {
        return Err(TripError::InvalidStartDate);
    }
    if ends_at < starts_at {
        return Err(TripError::InvalidEndDate);
    }
    Ok(())
}

#[derive(Template)]
#[template(path = "emails/trip_confirmation.html")]
struct TripConfirmationEmail<'a> {
    owner_name: &'a str,
    destination: &'a str,
    starts_at: String,
    ends_at: String,
    trip_url: String,
}

#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn TripStore>,
    mailer: Arc<dyn Mailer>,
    sender: Mailbox,
    public_base_url: String,
}

impl TripService {
    pub fn new(
        store: Arc<dyn TripStore>,
        mailer: Arc<dyn Mailer>,
        sender: Mailbox,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            sender,
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn create(&self, input: CreateTrip) -> Result<String, TripError> {
        self.create_at(input, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        input: CreateTrip,
        now: DateTime<Utc>,
    ) -> Result<String, TripError> {
        validate_dates(input.starts_at, input.ends_at, now)?;

        let trip_id = self
            .store
            .create_with_owner(NewTrip {
                destination: input.destination.clone(),
                starts_at: input.starts_at,
                ends_at: input.ends_at,
                owner: NewParticipant::owner(&input.owner_name, input.owner_email.to_string()),
            })
            .await?;
        info!(trip_id = %trip_id, destination = %input.destination, "trip created");

        self.send_confirmation(&trip_id, &input).await;

        Ok(trip_id)
    }

    pub async fn get(&self, trip_id: &str) -> Result<Option<TripDetails>, TripError> {
        let Some(trip) = self.store.find_trip(trip_id).await? else {
            return Ok(None);
        };
        let participants = self.store.list_participants(trip_id).await?;
        Ok(Some(TripDetails { trip, participants }))
    }

    /// Best effort: the trip already exists, so a failed send is only logged.
    async fn send_confirmation(&self, trip_id: &str, input: &CreateTrip) {
        let outcome = match self.confirmation_mail(trip_id, input) {
            Ok(mail) => self.mailer.send(mail).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(receipt) => {
                debug!(
                    trip_id = %trip_id,
                    transport = receipt.transport,
                    detail = %receipt.detail,
                    "confirmation mail sent"
                );
            }
            Err(err) => {
                warn!(trip_id = %trip_id, error = %err, "confirmation mail could not be sent");
            }
        }
    }

    fn confirmation_mail(
        &self,
        trip_id: &str,
        input: &CreateTrip,
    ) -> Result<OutgoingMail, MailError> {
        let html = TripConfirmationEmail {
            owner_name: &input.owner_name,
            destination: &input.destination,
            starts_at: input.starts_at.format(DATE_FORMAT).to_string(),
            ends_at: input.ends_at.format(DATE_FORMAT).to_string(),
            trip_url: format!("{}/trips/{trip_id}", self.public_base_url),
        }
        .render()?;

        let owner_name = Some(input.owner_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(OutgoingMail {
            from: self.sender.clone(),
            to: Mailbox::new(owner_name, input.owner_email.clone()),
            subject: format!("Your trip to {} is booked", input.destination),
            html,
        })
    }
}
