use anyhow::Context;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::models::{AttendanceRecord, Course};
use crate::standing;

/// Read-only client for the attendance REST backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

/// List endpoints answer either with a bare array or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PolicySettings {
    #[serde(default)]
    max_absence_percent: Option<serde_json::Value>,
}

impl PolicySettings {
    /// `None` only when the setting is absent; a present but unusable value is an error.
    fn max_absence_percent(&self) -> anyhow::Result<Option<i32>> {
        let value = match self.max_absence_percent.as_ref() {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let percent = match value {
            serde_json::Value::Number(n) => {
                let n = n.as_f64().context("max_absence_percent is not a finite number")?;
                standing::policy_percent(n)?
            }
            serde_json::Value::String(s) => standing::parse_policy(s)?,
            other => anyhow::bail!("max_absence_percent has an unexpected value: {other}"),
        };
        Ok(Some(percent))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SettingsBody {
    Wrapped { data: PolicySettings },
    Bare(PolicySettings),
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.api_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub async fn fetch_attendance(&self, student_id: &str) -> anyhow::Result<Vec<AttendanceRecord>> {
        let listing: Listing<AttendanceRecord> =
            self.get(&format!("attendance/student/{student_id}")).await?;
        Ok(listing.into_vec())
    }

    /// `None` when the backend has no `max_absence_percent` setting.
    pub async fn fetch_max_absence_percent(&self) -> anyhow::Result<Option<i32>> {
        let body: SettingsBody = self.get("settings").await?;
        let settings = match body {
            SettingsBody::Wrapped { data } => data,
            SettingsBody::Bare(settings) => settings,
        };
        settings.max_absence_percent()
    }

    pub async fn fetch_courses(&self) -> anyhow::Result<Vec<Course>> {
        let listing: Listing<Course> = self.get("courses").await?;
        Ok(listing.into_vec())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "GET");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{url} answered {status}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("unexpected response body from {url}"))
    }
}
