use serde::{Deserialize, Serialize};

/// Normalized current-weather value produced by a single provider.
///
/// Temperature is always Kelvin, humidity an integer percentage. Adapters are
/// responsible for converting whatever their upstream reports into this shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_k: f64,
    pub humidity_pct: u8,
}

/// Averaged reading returned by the aggregator.
///
/// The reduction step converts the averaged Kelvin value to Fahrenheit, so
/// this is a display-unit value rather than a canonical one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateReading {
    pub temperature_f: f64,
    pub humidity_pct: u8,
}

/// Response body for the aggregate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiWeatherReport {
    pub city: String,
    pub temp: f64,
    pub humidity: u8,
    pub took: String,
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin * 1.8 - 459.67
}
