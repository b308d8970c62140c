use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    conditions::openweather_icon,
    error::WeatherError,
    model::{GeocodedPlace, NormalizedWeather, round_kmh},
    provider::{ProviderId, get_json},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Keyed provider: OpenWeather direct geocoding + current weather.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Point both endpoints at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, WeatherError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);

        let request = self.http.get(url).query(&[
            ("q", query),
            ("limit", "1"),
            ("appid", self.api_key.as_str()),
        ]);

        let places: Vec<OwPlace> = get_json(request, "OpenWeather geocoding").await?;

        let place = places.into_iter().next().ok_or_else(|| WeatherError::PlaceNotFound {
            query: query.to_string(),
        })?;

        Ok(GeocodedPlace {
            latitude: place.lat,
            longitude: place.lon,
            name: place.name,
            country_code: place.country,
            region: place.state,
        })
    }

    async fn fetch_current(
        &self,
        place: &GeocodedPlace,
    ) -> Result<OwCurrentResponse, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let request = self.http.get(url).query(&[
            ("lat", place.latitude.to_string().as_str()),
            ("lon", place.longitude.to_string().as_str()),
            ("units", "metric"),
            ("appid", self.api_key.as_str()),
        ]);

        get_json(request, "OpenWeather current weather").await
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

fn normalize(place: &GeocodedPlace, current: OwCurrentResponse) -> NormalizedWeather {
    let condition = current.weather.into_iter().next();
    let icon = openweather_icon(condition.as_ref().and_then(|w| w.icon.as_deref()));
    let description = condition.map(|w| w.description).unwrap_or_default();

    NormalizedWeather {
        provider: ProviderId::OpenWeather,
        location_label: place.label(),
        city: place.name.clone(),
        country_code: place.country_code.clone(),
        temperature_c: current.main.temp,
        feels_like_c: current.main.feels_like,
        temp_min_c: current.main.temp_min,
        temp_max_c: current.main.temp_max,
        // m/s -> km/h
        wind_kmh: round_kmh(current.wind.speed * 3.6),
        humidity_pct: current.main.humidity.map(|h| h.round().clamp(0.0, 100.0) as u8),
        pressure_hpa: current.main.pressure.map(|p| p.round().max(0.0) as u32),
        description,
        icon,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError> {
        let place = self.geocode(query).await?;
        debug!(
            name = %place.name,
            lat = place.latitude,
            lon = place.longitude,
            "OpenWeather resolved place"
        );

        let current = self.fetch_current(&place).await?;
        Ok(normalize(&place, current))
    }
}
