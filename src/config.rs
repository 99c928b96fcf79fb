use std::{str::FromStr, time::Duration};

use anyhow::{Context, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub ws_idle_timeout: Duration,
    pub room_create_attempts: u32,
    pub session_inactivity: time::Duration,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        fn parsed<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            default: T,
        ) -> anyhow::Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} has an invalid value: {raw:?}")),
                None => Ok(default),
            }
        }

        let room_create_attempts: u32 = parsed(&lookup, "ROOM_CREATE_ATTEMPTS", 3)?;
        if room_create_attempts < 2 {
            return Err(anyhow!("ROOM_CREATE_ATTEMPTS must be at least 2"));
        }

        Ok(Config {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://pairchat.db?mode=rwc".to_owned()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_owned()),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 16)?,
            request_timeout: Duration::from_millis(parsed(&lookup, "REQUEST_TIMEOUT_MS", 5000)?),
            ws_idle_timeout: Duration::from_secs(parsed(&lookup, "WS_IDLE_TIMEOUT_SECS", 300)?),
            room_create_attempts,
            session_inactivity: time::Duration::minutes(parsed(
                &lookup,
                "SESSION_INACTIVITY_MINUTES",
                60,
            )?),
        })
    }
}
