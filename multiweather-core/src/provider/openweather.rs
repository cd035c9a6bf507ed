use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{error::ProviderError, model::Reading, provider::log_upstream};

use super::WeatherProvider;

const NAME: &str = "OpenWeatherMap";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
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

    /// Fetch current conditions in the raw upstream shape.
    ///
    /// The single-provider passthrough endpoint re-encodes this verbatim, so
    /// it is public rather than an implementation detail of the trait impl.
    pub async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, ProviderError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("APPID", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ProviderError::Network { provider: NAME, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Network { provider: NAME, source })?;

        log_upstream(NAME, status, &body);

        serde_json::from_str(&body).map_err(|source| ProviderError::Decode { provider: NAME, source })
    }
}

/// Upstream response: temperature is already Kelvin, humidity an integer
/// percent, so normalization is a field copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub main: MainConditions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConditions {
    pub temp: f64,
    pub humidity: u8,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn temp_and_humidity(&self, city: &str) -> Result<Reading, ProviderError> {
        let conditions = self.fetch_current(city).await?;

        Ok(Reading {
            temperature_k: conditions.main.temp,
            humidity_pct: conditions.main.humidity,
        })
    }
}
