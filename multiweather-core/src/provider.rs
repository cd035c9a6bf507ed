use crate::{
    Config, Reading,
    error::ProviderError,
    provider::{openweather::OpenWeatherProvider, underground::UndergroundProvider},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;
pub mod underground;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Underground,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Underground => "underground",
        }
    }

    /// Fixed provider order; the aggregator queries configured providers in
    /// this order.
    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Underground]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "underground" => Ok(ProviderId::Underground),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, underground."
            )),
        }
    }
}

/// One upstream weather source.
///
/// Implementations issue exactly one outbound call per invocation and
/// normalize whatever the upstream reports into a [`Reading`] (Kelvin,
/// integer percent humidity). No retries, no deadline.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Upstream name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn temp_and_humidity(&self, city: &str) -> Result<Reading, ProviderError>;
}

/// Record an upstream response without consuming it.
///
/// The body is already buffered, so the decoder reads the same bytes the log
/// line shows. Emitting the line cannot fail the request; at worst the
/// subscriber drops it and decoding continues.
pub(crate) fn log_upstream(provider: &str, status: StatusCode, body: &str) {
    tracing::debug!(provider, status = status.as_u16(), body, "upstream response");
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: add it under [providers.{id}] in the config file."
        )
    })?;

    let shared: Arc<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::new(api_key.to_owned())),
        ProviderId::Underground => Arc::new(UndergroundProvider::new(api_key.to_owned())),
    };

    Ok(shared)
}

/// Construct every configured provider, in [`ProviderId::all`] order.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Arc<dyn WeatherProvider>>> {
    ProviderId::all()
        .iter()
        .filter(|id| config.is_provider_configured(**id))
        .map(|id| provider_from_config(*id, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn providers_from_config_skips_unconfigured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::Underground, "KEY".to_string());

        let providers = providers_from_config(&cfg).expect("configured providers must build");
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "WeatherUnderground");
    }

    #[test]
    fn providers_from_config_preserves_fixed_order() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::Underground, "UG_KEY".to_string());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".to_string());

        let providers = providers_from_config(&cfg).expect("configured providers must build");
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["OpenWeatherMap", "WeatherUnderground"]);
    }
}
