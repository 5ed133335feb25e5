use super::types::{AirQualityReading, StationMatch};
use super::AqiError;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Upstream air-quality feed. `WaqiClient` is the production transport; tests
/// and offline development swap in mock implementations.
#[async_trait]
pub trait AqiFeed: Send + Sync {
    /// Per-station lookup by display name or station query string.
    async fn feed(&self, station: &str) -> Result<AirQualityReading, AqiError>;

    /// Free-text station search.
    async fn search(&self, keyword: &str) -> Result<Vec<StationMatch>, AqiError>;

    /// Lightweight connectivity probe with a shorter timeout than data
    /// fetches.
    async fn probe(&self) -> Result<(), AqiError>;
}

pub struct WaqiClient {
    client: Client,
    config: Config,
}

impl WaqiClient {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent("AqiDashboard/1.0")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AqiError> {
        let url = format!("{}{}", self.config.waqi_base_url, endpoint);
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("token", self.config.waqi_api_token.as_str()));

        tracing::debug!(%url, "requesting upstream");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AqiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AqiError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AqiError::Network(e.to_string()))?;
        let envelope: Value = serde_json::from_str(&body)?;
        unwrap_envelope(envelope)
    }
}

/// The upstream wraps every payload as `{ "status": "ok"|"error", "data": .. }`;
/// error responses carry the message in `data` or `message`.
fn unwrap_envelope<T: DeserializeOwned>(envelope: Value) -> Result<T, AqiError> {
    if envelope.get("status").and_then(Value::as_str) != Some("ok") {
        let message = envelope
            .get("data")
            .and_then(Value::as_str)
            .or_else(|| envelope.get("message").and_then(Value::as_str))
            .unwrap_or("API request failed");
        return Err(AqiError::Upstream(message.to_string()));
    }
    let data = envelope.get("data").cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

#[async_trait]
impl AqiFeed for WaqiClient {
    async fn feed(&self, station: &str) -> Result<AirQualityReading, AqiError> {
        let endpoint = format!(
            "{}/{}",
            self.config.waqi_feed_path,
            urlencoding::encode(station)
        );
        let reading: AirQualityReading = self.request(&endpoint, &[]).await?;
        reading
            .validate()
            .map_err(|reason| AqiError::Upstream(format!("invalid reading: {}", reason)))?;
        Ok(reading)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<StationMatch>, AqiError> {
        self.request(&self.config.waqi_search_path, &[("keyword", keyword)])
            .await
    }

    async fn probe(&self) -> Result<(), AqiError> {
        let url = format!(
            "{}{}/{}",
            self.config.waqi_base_url,
            self.config.waqi_feed_path,
            urlencoding::encode(&self.config.probe_station)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.config.waqi_api_token.as_str())])
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .await
            .map_err(|e| AqiError::ConnectivityCheckFailed(e.to_string()))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| AqiError::ConnectivityCheckFailed(e.to_string()))?;

        if envelope.get("status").and_then(Value::as_str) == Some("ok") {
            Ok(())
        } else {
            Err(AqiError::ConnectivityCheckFailed(
                "upstream probe returned non-ok status".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope_ok_status() {
        let envelope = json!({ "status": "ok", "data": [ { "station": { "name": "Shanghai", "geo": [31.2047, 121.4489], "url": "shanghai" } } ] });
        let matches: Vec<StationMatch> = unwrap_envelope(envelope).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].station.name, "Shanghai");
    }

    #[test]
    fn test_unwrap_envelope_error_status_uses_data_message() {
        let envelope = json!({ "status": "error", "data": "Unknown station" });
        let result: Result<Vec<StationMatch>, AqiError> = unwrap_envelope(envelope);
        match result {
            Err(AqiError::Upstream(message)) => assert_eq!(message, "Unknown station"),
            other => panic!("expected upstream error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unwrap_envelope_error_status_falls_back_to_message_field() {
        let envelope = json!({ "status": "error", "message": "over quota" });
        let result: Result<Vec<StationMatch>, AqiError> = unwrap_envelope(envelope);
        match result {
            Err(AqiError::Upstream(message)) => assert_eq!(message, "over quota"),
            other => panic!("expected upstream error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unwrap_envelope_malformed_payload_is_parse_error() {
        let envelope = json!({ "status": "ok", "data": { "unexpected": true } });
        let result: Result<Vec<StationMatch>, AqiError> = unwrap_envelope(envelope);
        assert!(matches!(result, Err(AqiError::JsonParsing(_))));
    }
}
