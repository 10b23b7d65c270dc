// src/config.rs

use std::env;
use std::str::FromStr;
use dotenvy::dotenv;

/// Default lifetime number of exams a free-plan user may take.
pub const DEFAULT_FREE_TEST_LIMIT: i64 = 5;

/// Default time a finished session stays readable before it is purged.
pub const DEFAULT_SESSION_RETENTION_MINUTES: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub free_test_limit: i64,
    pub session_retention_minutes: u64,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let static_dir = env::var("STATIC_DIR")
            .unwrap_or_else(|_| ".".to_string());

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port: parse_or("PORT", 5000),
            free_test_limit: parse_or("FREE_TEST_LIMIT", DEFAULT_FREE_TEST_LIMIT),
            session_retention_minutes: parse_or(
                "SESSION_RETENTION_MINUTES",
                DEFAULT_SESSION_RETENTION_MINUTES,
            ),
            static_dir,
        }
    }
}

/// Reads a numeric variable, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
