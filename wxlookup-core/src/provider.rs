use crate::{
    Config, NormalizedWeather, ProviderConfig, WeatherError,
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "openweather")]
    OpenWeather,
    #[serde(rename = "open-meteo")]
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "open-meteo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo]
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
            "open-meteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, open-meteo."
            )),
        }
    }
}

/// Geocode a free-text place, then fetch and normalize its current conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// `query` must already be trimmed and non-empty.
    async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError>;
}

/// Construct the adapter selected by `provider`, sharing `http` for both calls.
pub fn provider_from_config(provider: &ProviderConfig, http: Client) -> Box<dyn WeatherProvider> {
    match provider {
        ProviderConfig::OpenWeather { api_key } => {
            Box::new(OpenWeatherProvider::new(api_key.clone()).with_http(http))
        }
        ProviderConfig::OpenMeteo => Box::new(OpenMeteoProvider::new().with_http(http)),
    }
}

/// HTTP client honoring the optional request timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("wxlookup/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build HTTP client")
}

/// Send `request` and decode a JSON body, classifying failures.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T, WeatherError> {
    let res = request.send().await.map_err(WeatherError::network)?;

    let status = res.status();
    let body = res.text().await.map_err(WeatherError::network)?;

    if !status.is_success() {
        tracing::debug!(%status, what, "provider returned an error status");
        let message = provider_message(&body)
            .unwrap_or_else(|| format!("{what} failed ({})", status.as_u16()));
        return Err(WeatherError::Provider(message));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::debug!(error = %e, what, "failed to decode provider response");
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(_) => WeatherError::Provider(format!("{what}: unexpected response ({e})")),
            Err(_) if body.trim().is_empty() => {
                WeatherError::Provider(format!("{what}: empty response"))
            }
            Err(_) => WeatherError::Provider(truncate_body(&body)),
        }
    })
}

/// Best human-readable message in an error body: the provider's own `message`
/// or `reason` field, else the raw text. `None` for an empty body.
fn provider_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => ["message", "reason"]
            .iter()
            .find_map(|key| json.get(key).and_then(|v| v.as_str()))
            .filter(|m| !m.is_empty())
            .map(str::to_owned),
        Err(_) => Some(truncate_body(body)),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
