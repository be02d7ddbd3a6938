use std::sync::Arc;

use lettre::message::Mailbox;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{mailer::Mailer, trip_store::SqliteTripStore, trips::TripService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub trips: TripService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, mailer: Arc<dyn Mailer>) -> Self {
        let sender = Mailbox::new(
            Some(config.mail_from_name.clone()),
            config.mail_from_address.clone(),
        );
        let store = Arc::new(SqliteTripStore::new(db.clone()));
        let trips = TripService::new(store, mailer, sender, config.public_base_url.clone());
        Self { config, db, trips }
    }
}
