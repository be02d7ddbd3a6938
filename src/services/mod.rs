pub mod mailer;
pub mod trip_store;
pub mod trips;
