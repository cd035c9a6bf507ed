//! Error taxonomy for provider queries and aggregation.

use thiserror::Error;

/// A provider query that could not produce a normalized reading.
///
/// Every variant names the upstream it came from; no distinction is made
/// between transient and permanent failure, and nothing is retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: could not decode response body: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider}: could not parse humidity {raw:?}")]
    HumidityParse { provider: &'static str, raw: String },
}

impl ProviderError {
    /// Name of the upstream this error came from.
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Network { provider, .. }
            | Self::Decode { provider, .. }
            | Self::HumidityParse { provider, .. } => provider,
        }
    }
}

/// Outcome of a multi-provider aggregation that produced no reading.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Averaging over zero providers is undefined; the aggregator refuses
    /// the call instead of dividing by the provider count.
    #[error("no weather providers configured")]
    NoProviders,

    /// The first provider failure observed. Whatever the other providers did
    /// is discarded.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
