//! HTTP plumbing around the aggregation core.

use std::{convert::Infallible, sync::Arc, time::Instant};

use multiweather_core::{
    Config, MultiProvider, MultiWeatherReport, ProviderId,
    provider::{openweather::OpenWeatherProvider, providers_from_config},
};
use warp::{Filter, Reply, http::StatusCode, reply::Response};

/// Per-process state: the fixed provider set, built once at startup.
pub struct AppState {
    pub aggregator: MultiProvider,
    /// Concrete OpenWeather adapter backing the single-provider passthrough
    /// route; absent when no key is configured.
    pub openweather: Option<Arc<OpenWeatherProvider>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let aggregator = MultiProvider::new(providers_from_config(config)?);
        let openweather = config
            .provider_api_key(ProviderId::OpenWeather)
            .map(|key| Arc::new(OpenWeatherProvider::new(key.to_owned())));

        Ok(Self { aggregator, openweather })
    }
}

/// All routes of the service.
pub fn api(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    hello().or(weather(state.clone())).or(multiweather(state))
}

fn hello() -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    warp::path!("hello").and(warp::get()).map(|| "hello!")
}

fn weather(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    warp::path!("weather" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(weather_handler)
}

fn multiweather(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    warp::path!("multiweather" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(multiweather_handler)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Single-provider passthrough: raw OpenWeather-shaped JSON.
async fn weather_handler(city: String, state: Arc<AppState>) -> Result<Response, Infallible> {
    let Some(provider) = &state.openweather else {
        return Ok(error_reply("No API key configured for provider 'openweather'."));
    };

    match provider.fetch_current(&city).await {
        Ok(conditions) => Ok(warp::reply::json(&conditions).into_response()),
        Err(err) => Ok(error_reply(&err.to_string())),
    }
}

/// Aggregate endpoint: averaged reading plus how long the fan-out took.
async fn multiweather_handler(city: String, state: Arc<AppState>) -> Result<Response, Infallible> {
    let begin = Instant::now();

    match state.aggregator.temp_and_humidity(&city).await {
        Ok(reading) => {
            let report = MultiWeatherReport {
                city,
                temp: reading.temperature_f,
                humidity: reading.humidity_pct,
                took: format!("{:?}", begin.elapsed()),
            };
            Ok(warp::reply::json(&report).into_response())
        }
        Err(err) => Ok(error_reply(&err.to_string())),
    }
}

fn error_reply(message: &str) -> Response {
    warp::reply::with_status(message.to_owned(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
}
