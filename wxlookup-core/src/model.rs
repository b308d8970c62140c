use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// A place resolved by a provider's geocoding endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country_code: String,
    pub region: Option<String>,
}

impl GeocodedPlace {
    /// "Paris, Ile-de-France, FR", or "Paris, FR" when the region is unknown.
    pub fn label(&self) -> String {
        match self.region.as_deref().filter(|r| !r.is_empty()) {
            Some(region) => format!("{}, {}, {}", self.name, region, self.country_code),
            None => format!("{}, {}", self.name, self.country_code),
        }
    }
}

/// Display glyph category for the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconKey {
    #[default]
    Clear,
    Cloud,
    Drizzle,
    Rain,
    Snow,
}

impl IconKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconKey::Clear => "clear",
            IconKey::Cloud => "cloud",
            IconKey::Drizzle => "drizzle",
            IconKey::Rain => "rain",
            IconKey::Snow => "snow",
        }
    }
}

/// Current conditions in one shape, whichever provider produced them.
///
/// `Option` fields are `None` exactly when the provider does not report them.
/// Renderers must skip those rows rather than print a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    pub provider: ProviderId,
    pub location_label: String,
    /// Geocoded place name, without region or country.
    pub city: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub wind_kmh: i32,
    pub humidity_pct: Option<u8>,
    pub pressure_hpa: Option<u32>,
    pub description: String,
    pub icon: IconKey,
}

/// One row of the hosted search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub city: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub provider: ProviderId,
    /// Assigned by the store; `None` until the entry has been persisted.
    pub timestamp: Option<DateTime<Utc>>,
}

impl SearchLogEntry {
    pub fn from_weather(weather: &NormalizedWeather) -> Self {
        Self {
            city: weather.city.clone(),
            country_code: weather.country_code.clone(),
            temperature_c: weather.temperature_c,
            provider: weather.provider,
            timestamp: None,
        }
    }
}

/// Rounds a wind speed to whole km/h.
pub(crate) fn round_kmh(kmh: f64) -> i32 {
    kmh.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris(region: Option<&str>) -> GeocodedPlace {
        GeocodedPlace {
            latitude: 48.85,
            longitude: 2.35,
            name: "Paris".into(),
            country_code: "FR".into(),
            region: region.map(str::to_owned),
        }
    }

    #[test]
    fn label_includes_region_when_known() {
        assert_eq!(paris(Some("Ile-de-France")).label(), "Paris, Ile-de-France, FR");
    }

    #[test]
    fn label_skips_missing_or_blank_region() {
        assert_eq!(paris(None).label(), "Paris, FR");
        assert_eq!(paris(Some("")).label(), "Paris, FR");
    }

    #[test]
    fn round_kmh_rounds_to_nearest() {
        assert_eq!(round_kmh(12.4), 12);
        assert_eq!(round_kmh(12.5), 13);
        assert_eq!(round_kmh(5.0 * 3.6), 18);
    }

    #[test]
    fn absent_fields_serialize_as_null_not_zero() {
        let weather = NormalizedWeather {
            provider: ProviderId::OpenMeteo,
            location_label: "Paris, FR".into(),
            city: "Paris".into(),
            country_code: "FR".into(),
            temperature_c: 0.0,
            feels_like_c: None,
            temp_min_c: None,
            temp_max_c: None,
            wind_kmh: 0,
            humidity_pct: None,
            pressure_hpa: None,
            description: "clear sky".into(),
            icon: IconKey::Clear,
        };

        let json = serde_json::to_value(&weather).expect("serialize");
        assert_eq!(json["temperature_c"], 0.0);
        assert!(json["humidity_pct"].is_null());
        assert!(json["feels_like_c"].is_null());
        assert_eq!(json["provider"], "open-meteo");
        assert_eq!(json["icon"], "clear");
    }
}
