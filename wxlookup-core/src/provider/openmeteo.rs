use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    conditions::open_meteo_condition,
    error::WeatherError,
    model::{GeocodedPlace, NormalizedWeather, round_kmh},
    provider::{ProviderId, get_json},
};

use super::WeatherProvider;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com";

/// Keyless provider: Open-Meteo geocoding + `current_weather` snapshot.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    geocoding_url: String,
    forecast_url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Open-Meteo serves geocoding and forecasts from different hosts.
    pub fn with_base_urls(
        mut self,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        self.geocoding_url = geocoding_url.into().trim_end_matches('/').to_string();
        self.forecast_url = forecast_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, WeatherError> {
        let url = format!("{}/v1/search", self.geocoding_url);

        let request = self.http.get(url).query(&[
            ("name", query),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ]);

        let parsed: OmGeocodingResponse = get_json(request, "Open-Meteo geocoding").await?;

        let place = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::PlaceNotFound { query: query.to_string() })?;

        Ok(GeocodedPlace {
            latitude: place.latitude,
            longitude: place.longitude,
            name: place.name,
            country_code: place.country_code,
            region: place.admin1,
        })
    }

    async fn fetch_current(&self, place: &GeocodedPlace) -> Result<OmCurrentWeather, WeatherError> {
        let url = format!("{}/v1/forecast", self.forecast_url);

        let request = self.http.get(url).query(&[
            ("latitude", place.latitude.to_string().as_str()),
            ("longitude", place.longitude.to_string().as_str()),
            ("current_weather", "true"),
        ]);

        let parsed: OmForecastResponse = get_json(request, "Open-Meteo forecast").await?;

        parsed.current_weather.ok_or_else(|| {
            WeatherError::provider("Open-Meteo forecast response contained no current weather")
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country_code: String,
    admin1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    /// Already km/h.
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current_weather: Option<OmCurrentWeather>,
}

fn normalize(place: &GeocodedPlace, current: OmCurrentWeather) -> NormalizedWeather {
    let (description, icon) = open_meteo_condition(current.weathercode);

    NormalizedWeather {
        provider: ProviderId::OpenMeteo,
        location_label: place.label(),
        city: place.name.clone(),
        country_code: place.country_code.clone(),
        temperature_c: current.temperature,
        feels_like_c: None,
        temp_min_c: None,
        temp_max_c: None,
        wind_kmh: round_kmh(current.windspeed),
        humidity_pct: None,
        pressure_hpa: None,
        description: description.to_string(),
        icon,
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError> {
        let place = self.geocode(query).await?;
        debug!(
            name = %place.name,
            lat = place.latitude,
            lon = place.longitude,
            "Open-Meteo resolved place"
        );

        let current = self.fetch_current(&place).await?;
        Ok(normalize(&place, current))
    }
}
