use std::env;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub api_url: String,
    pub api_token: Option<String>,
    pub api_timeout: Duration,
    pub db_max_connections: u32,
}

impl Config {
    /// Reads settings from the environment, after loading a `.env` file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_timeout_secs = parse_var("ATTENDANCE_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            api_url: non_empty_var("ATTENDANCE_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: non_empty_var("ATTENDANCE_API_TOKEN"),
            api_timeout: Duration::from_secs(api_timeout_secs),
            db_max_connections,
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} must be a number, got `{value}`")),
        None => Ok(default),
    }
}
