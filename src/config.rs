use std::{env, net::SocketAddr};

use lettre::Address;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub smtp_url: Option<String>,
    pub mail_from_name: String,
    pub mail_from_address: Address,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://planner.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3333".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let smtp_url = env::var("SMTP_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let mail_from_name =
            env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Equipe plann.er".to_string());
        let mail_from_address: Address = env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "oi@plann.er".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid MAIL_FROM_ADDRESS: {err}")))?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url,
            listen_addr,
            smtp_url,
            mail_from_name,
            mail_from_address,
            public_base_url,
        })
    }
}
