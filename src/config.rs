// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Shared secret required to register a mentor account.
    pub mentor_secret_key: String,
    /// Shared secret required to register an admin account.
    pub admin_secret_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let mentor_secret_key =
            env::var("MENTOR_SECRET_KEY").expect("MENTOR_SECRET_KEY must be set");

        let admin_secret_key = env::var("ADMIN_SECRET_KEY").expect("ADMIN_SECRET_KEY must be set");

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            mentor_secret_key,
            admin_secret_key,
        }
    }
}
