//! HTTP client for the robot's sensor components and generic services.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::{self, Credentials};

#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid robot address: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid credential header: {0}")]
    Credentials(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Server error: {0}")]
    Server(String),
}

/// Numeric metrics reported by a sensor, keyed by metric name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings(HashMap<String, f64>);

impl Readings {
    /// Keep only the numeric entries of a raw readings map
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(
            map.into_iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k, n)))
                .collect(),
        )
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).copied()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Readings {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ReadingsResponse {
    #[serde(default)]
    readings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct DoCommandRequest<'a> {
    command: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DoCommandResponse {
    #[serde(default)]
    result: serde_json::Value,
}

/// Connection to the robot, established once at startup
pub struct RobotClient {
    client: reqwest::Client,
    base: Url,
}

impl RobotClient {
    /// Connect using an API key pair and check the robot is reachable
    pub async fn connect(address: &str, credentials: &Credentials) -> Result<Self, RobotError> {
        let client = Self::client_builder(credentials)?.build()?;
        Self::connect_with(address, client).await
    }

    /// Client carrying the key pair on every request
    pub(crate) fn client_builder(
        credentials: &Credentials,
    ) -> Result<reqwest::ClientBuilder, RobotError> {
        let mut headers = HeaderMap::new();
        headers.insert("key_id", HeaderValue::from_str(&credentials.api_key_id)?);
        let mut key = HeaderValue::from_str(&credentials.api_key)?;
        key.set_sensitive(true);
        headers.insert("key", key);

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config::REQUEST_TIMEOUT))
    }

    pub(crate) async fn connect_with(
        address: &str,
        client: reqwest::Client,
    ) -> Result<Self, RobotError> {
        let base = Url::parse(address)?;
        let robot = Self { client, base };

        let url = robot.base.join("api/v1/status")?;
        log::info!("Connecting to robot at {}", robot.base);
        let response = robot.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RobotError::Server(format!("{}: {}", status, body)));
        }

        log::info!("Connected to robot at {}", robot.base);
        Ok(robot)
    }

    /// Fetch the current readings of a named sensor
    pub async fn get_readings(&self, sensor: &str) -> Result<Readings, RobotError> {
        let url = self
            .base
            .join(&format!("api/v1/components/sensor/{}/readings", sensor))?;

        let response = self.client.post(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RobotError::Server(format!("{}: {}", status, body)));
        }

        let body: ReadingsResponse = response.json().await?;
        let readings = Readings::from_map(body.readings);
        log::debug!("{} readings: {:?}", sensor, readings);
        Ok(readings)
    }

    /// Send a free-form command to a named generic service
    pub async fn do_command(
        &self,
        service: &str,
        command: &serde_json::Value,
    ) -> Result<serde_json::Value, RobotError> {
        let url = self
            .base
            .join(&format!("api/v1/services/generic/{}/do_command", service))?;

        let response = self
            .client
            .post(url)
            .json(&DoCommandRequest { command })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RobotError::Server(format!("{}: {}", status, body)));
        }

        let body: DoCommandResponse = response.json().await?;
        Ok(body.result)
    }

    /// Close the connection
    pub async fn close(self) {
        log::info!("Closing robot connection to {}", self.base);
        drop(self.client);
    }
}
