//! Concurrent fan-out/fan-in over the configured providers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    error::{AggregateError, ProviderError},
    model::{AggregateReading, Reading, kelvin_to_fahrenheit},
    provider::WeatherProvider,
};

/// Fans a city query out to every configured provider and reduces the
/// answers into one averaged reading.
///
/// The provider list is fixed at construction. Every call spawns one worker
/// per provider; the first error observed wins and is returned immediately,
/// while the remaining in-flight queries run to completion on their own and
/// have their results discarded.
#[derive(Debug, Clone)]
pub struct MultiProvider {
    providers: Vec<Arc<dyn WeatherProvider>>,
}

impl MultiProvider {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query all providers in parallel and average the results.
    ///
    /// On success the temperature is the Fahrenheit conversion of the
    /// averaged Kelvin readings; humidity is the integer mean, truncating
    /// toward zero.
    pub async fn temp_and_humidity(&self, city: &str) -> Result<AggregateReading, AggregateError> {
        let count = self.providers.len();
        if count == 0 {
            return Err(AggregateError::NoProviders);
        }

        // One slot per provider on each channel, so a worker finishing after
        // an early error return never blocks on a receiver that is gone.
        let (reading_tx, mut reading_rx) = mpsc::channel::<Reading>(count);
        let (error_tx, mut error_rx) = mpsc::channel::<ProviderError>(count);

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let city = city.to_owned();
            let reading_tx = reading_tx.clone();
            let error_tx = error_tx.clone();

            tokio::spawn(async move {
                // Exactly one signal per worker. Send failures mean the
                // aggregator already returned; the result is simply dropped.
                match provider.temp_and_humidity(&city).await {
                    Ok(reading) => {
                        let _ = reading_tx.send(reading).await;
                    }
                    Err(err) => {
                        tracing::warn!(provider = provider.name(), error = %err, "provider query failed");
                        let _ = error_tx.send(err).await;
                    }
                }
            });
        }
        drop(reading_tx);
        drop(error_tx);

        let mut temperature_sum = 0.0;
        let mut humidity_sum: u32 = 0;

        // Wait for one signal per provider, in completion order. Whichever
        // of the two channels is ready first gets picked.
        for _ in 0..count {
            tokio::select! {
                Some(reading) = reading_rx.recv() => {
                    temperature_sum += reading.temperature_k;
                    humidity_sum += u32::from(reading.humidity_pct);
                }
                Some(err) = error_rx.recv() => {
                    return Err(err.into());
                }
            }
        }

        let average_k = temperature_sum / count as f64;
        tracing::debug!(city, average_k, "aggregated {count} providers");

        Ok(AggregateReading {
            temperature_f: kelvin_to_fahrenheit(average_k),
            humidity_pct: (humidity_sum / count as u32) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    const TOLERANCE: f64 = 1e-9;

    /// Always answers with a fixed reading, after an optional delay.
    #[derive(Debug)]
    struct StaticProvider {
        reading: Reading,
        delay: Duration,
    }

    impl StaticProvider {
        fn instant(temperature_k: f64, humidity_pct: u8) -> Arc<dyn WeatherProvider> {
            Self::delayed(temperature_k, humidity_pct, Duration::ZERO)
        }

        fn delayed(
            temperature_k: f64,
            humidity_pct: u8,
            delay: Duration,
        ) -> Arc<dyn WeatherProvider> {
            Arc::new(Self { reading: Reading { temperature_k, humidity_pct }, delay })
        }
    }

    #[async_trait]
    impl WeatherProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn temp_and_humidity(&self, _city: &str) -> Result<Reading, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.reading)
        }
    }

    /// Always fails with a humidity parse error, after an optional delay.
    #[derive(Debug)]
    struct FailingProvider {
        delay: Duration,
    }

    impl FailingProvider {
        fn instant() -> Arc<dyn WeatherProvider> {
            Arc::new(Self { delay: Duration::ZERO })
        }
    }

    #[async_trait]
    impl WeatherProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn temp_and_humidity(&self, _city: &str) -> Result<Reading, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Err(ProviderError::HumidityParse { provider: "failing", raw: "5%".into() })
        }
    }

    #[tokio::test]
    async fn no_providers_is_rejected() {
        let mw = MultiProvider::new(Vec::new());
        let err = mw.temp_and_humidity("kyiv").await.unwrap_err();

        assert!(matches!(err, AggregateError::NoProviders));
    }

    #[tokio::test]
    async fn single_provider_average_is_identity() {
        let mw = MultiProvider::new(vec![StaticProvider::instant(300.0, 55)]);
        let reading = mw.temp_and_humidity("kyiv").await.unwrap();

        assert!((reading.temperature_f - kelvin_to_fahrenheit(300.0)).abs() < TOLERANCE);
        assert_eq!(reading.humidity_pct, 55);
    }

    #[tokio::test]
    async fn identical_readings_average_to_themselves() {
        let mw = MultiProvider::new(vec![
            StaticProvider::instant(289.45, 87),
            StaticProvider::instant(289.45, 87),
            StaticProvider::instant(289.45, 87),
        ]);
        let reading = mw.temp_and_humidity("london").await.unwrap();

        assert!((reading.temperature_f - kelvin_to_fahrenheit(289.45)).abs() < TOLERANCE);
        assert_eq!(reading.humidity_pct, 87);
    }

    #[tokio::test]
    async fn average_is_independent_of_completion_order() {
        let providers = |delays: [u64; 3]| {
            MultiProvider::new(vec![
                StaticProvider::delayed(290.0, 50, Duration::from_millis(delays[0])),
                StaticProvider::delayed(300.0, 60, Duration::from_millis(delays[1])),
                StaticProvider::delayed(310.0, 70, Duration::from_millis(delays[2])),
            ])
        };

        let forward = providers([0, 15, 30]).temp_and_humidity("oslo").await.unwrap();
        let reversed = providers([30, 15, 0]).temp_and_humidity("oslo").await.unwrap();

        assert!((forward.temperature_f - kelvin_to_fahrenheit(300.0)).abs() < TOLERANCE);
        assert_eq!(forward.humidity_pct, 60);
        assert_eq!(forward, reversed);
    }

    #[tokio::test]
    async fn humidity_average_truncates_toward_zero() {
        let mw = MultiProvider::new(vec![
            StaticProvider::instant(290.0, 50),
            StaticProvider::instant(290.0, 51),
        ]);
        let reading = mw.temp_and_humidity("kyiv").await.unwrap();

        assert_eq!(reading.humidity_pct, 50);
    }

    #[tokio::test]
    async fn first_error_wins_over_slow_successes() {
        let mw = MultiProvider::new(vec![
            StaticProvider::delayed(290.0, 50, Duration::from_millis(200)),
            FailingProvider::instant(),
            StaticProvider::delayed(300.0, 60, Duration::from_millis(200)),
        ]);

        let err = mw.temp_and_humidity("kyiv").await.unwrap_err();

        match err {
            AggregateError::Provider(ProviderError::HumidityParse { provider, raw }) => {
                assert_eq!(provider, "failing");
                assert_eq!(raw, "5%");
            }
            other => panic!("expected the injected provider error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn all_failures_return_an_error() {
        let mw = MultiProvider::new(vec![FailingProvider::instant(), FailingProvider::instant()]);

        let err = mw.temp_and_humidity("kyiv").await.unwrap_err();
        assert!(matches!(err, AggregateError::Provider(_)));
    }
}
