// SPDX-License-Identifier: MIT

//! Weather lookup: geocode by name, then fetch the forecast (Open-Meteo)

use crate::adk::error::FetchError;
use crate::adk::tool::Tool;
use crate::meteo::http::{HttpFetcher, HttpRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const NOT_AVAILABLE: &str = "not available";
const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,sunrise,sunset";

/// First geocoding candidate for a place name
#[derive(Debug, Clone, PartialEq)]
pub struct LocationResult {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingCandidate {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurrentWeather {
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    weather_code: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailyWeather {
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Option<CurrentWeather>,
    #[serde(default)]
    daily: Option<DailyWeather>,
}

#[derive(Debug, Error)]
enum WeatherFailure {
    #[error("{stage} request failed: {source}")]
    Network {
        stage: &'static str,
        source: FetchError,
    },
    #[error("{stage} service answered with HTTP {status}")]
    Status { stage: &'static str, status: u16 },
    #[error("{stage} response could not be read: {message}")]
    Decode {
        stage: &'static str,
        message: String,
    },
}

/// Geocode-then-forecast chain exposed as the `get_weather` tool
pub struct WeatherTool {
    fetcher: Arc<dyn HttpFetcher>,
    geocoding_url: String,
    forecast_url: String,
    language: String,
    timeout: Duration,
}

impl WeatherTool {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            language: language.into(),
            timeout,
        }
    }

    pub fn with_endpoints(
        mut self,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        self.geocoding_url = geocoding_url.into();
        self.forecast_url = forecast_url.into();
        self
    }

    /// Resolve a place name; the first candidate wins
    async fn geocode(&self, location: &str) -> Result<Option<LocationResult>, WeatherFailure> {
        let stage = "Geocoding";
        let request = HttpRequest::get(&self.geocoding_url, self.timeout)
            .query("name", location)
            .query("count", "1")
            .query("language", &self.language)
            .query("format", "json");

        let resp = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|source| WeatherFailure::Network { stage, source })?;
        if !resp.is_success() {
            return Err(WeatherFailure::Status {
                stage,
                status: resp.status,
            });
        }

        let parsed: GeocodingResponse =
            serde_json::from_str(&resp.body).map_err(|e| WeatherFailure::Decode {
                stage,
                message: e.to_string(),
            })?;

        Ok(parsed
            .results
            .and_then(|r| r.into_iter().next())
            .map(|c| LocationResult {
                latitude: c.latitude,
                longitude: c.longitude,
                display_name: c.name,
                country: c.country.unwrap_or_default(),
            }))
    }

    async fn forecast(&self, place: &LocationResult) -> Result<ForecastResponse, WeatherFailure> {
        let stage = "Forecast";
        let request = HttpRequest::get(&self.forecast_url, self.timeout)
            .query("latitude", place.latitude.to_string())
            .query("longitude", place.longitude.to_string())
            .query("current", CURRENT_FIELDS)
            .query("daily", DAILY_FIELDS)
            .query("timezone", "auto");

        let resp = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|source| WeatherFailure::Network { stage, source })?;
        if !resp.is_success() {
            return Err(WeatherFailure::Status {
                stage,
                status: resp.status,
            });
        }

        serde_json::from_str(&resp.body).map_err(|e| WeatherFailure::Decode {
            stage,
            message: e.to_string(),
        })
    }

    /// Run the whole chain; always produces text
    pub async fn get_weather(&self, location: &str) -> String {
        let location = location.trim();
        if location.is_empty() {
            return "Please tell me which city or place you want the weather for.".to_string();
        }

        let place = match self.geocode(location).await {
            Ok(Some(place)) => place,
            Ok(None) => {
                log::info!("No geocoding match for '{}'", location);
                return format!(
                    "I could not find the location '{}'. Try being more specific.",
                    location
                );
            }
            Err(e) => {
                log::warn!("Weather lookup for '{}' failed: {}", location, e);
                return format!("Error getting the weather for '{}': {}", location, e);
            }
        };

        match self.forecast(&place).await {
            Ok(forecast) => render_report(&place, &forecast),
            Err(e) => {
                log::warn!("Weather lookup for '{}' failed: {}", location, e);
                format!(
                    "Error getting the weather for {}: {}",
                    place.display_name, e
                )
            }
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Useful to know the current weather, temperature or today's forecast for a city or place. \
         Input: the place name."
    }

    async fn invoke(&self, input: &str) -> String {
        self.get_weather(input).await
    }
}

fn value(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(v) => format!("{}{}", v, unit),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn first<T: Clone>(values: &[Option<T>]) -> Option<T> {
    values.first().cloned().flatten()
}

fn render_report(place: &LocationResult, forecast: &ForecastResponse) -> String {
    let empty_current = CurrentWeather::default();
    let empty_daily = DailyWeather::default();
    let current = forecast.current.as_ref().unwrap_or(&empty_current);
    let daily = forecast.daily.as_ref().unwrap_or(&empty_daily);

    let header = if place.country.is_empty() {
        place.display_name.clone()
    } else {
        format!("{}, {}", place.display_name, place.country)
    };
    let conditions = current
        .weather_code
        .map(weather_description)
        .unwrap_or(NOT_AVAILABLE);

    let mut report = format!("Current weather in {}:\n", header);
    report.push_str(&format!("- Conditions: {}\n", conditions));
    report.push_str(&format!(
        "- Temperature: {}\n",
        value(current.temperature_2m, "°C")
    ));
    report.push_str(&format!(
        "- Feels like: {}\n",
        value(current.apparent_temperature, "°C")
    ));
    report.push_str(&format!(
        "- Humidity: {}\n",
        value(current.relative_humidity_2m, "%")
    ));
    report.push_str(&format!(
        "- Wind: {}\n",
        value(current.wind_speed_10m, " km/h")
    ));
    report.push_str(&format!(
        "- Today's high: {}\n",
        value(first(&daily.temperature_2m_max), "°C")
    ));
    report.push_str(&format!(
        "- Today's low: {}\n",
        value(first(&daily.temperature_2m_min), "°C")
    ));
    report.push_str(&format!(
        "- Sunrise: {}\n",
        first(&daily.sunrise).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    ));
    report.push_str(&format!(
        "- Sunset: {}",
        first(&daily.sunset).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    ));
    report
}

/// Short text for a WMO weather interpretation code
pub fn weather_description(code: u32) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 53 | 55 => "drizzle",
        56 | 57 => "freezing drizzle",
        61 | 63 | 65 => "rain",
        66 | 67 => "freezing rain",
        71 | 73 | 75 => "snow",
        77 => "snow grains",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => "unknown conditions",
    }
}
