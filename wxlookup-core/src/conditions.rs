//! Static condition-code tables for both providers.
//!
//! Pure lookups with no I/O, so the HTTP adapters only have to pull the raw
//! code out of the payload.

use crate::model::IconKey;

/// Icon category for an OpenWeather icon code such as `"10d"`.
///
/// Only the two leading digits matter; day/night suffixes are ignored.
/// Unknown or missing codes fall back to [`IconKey::Clear`].
pub fn openweather_icon(code: Option<&str>) -> IconKey {
    let prefix = code.and_then(|c| c.get(..2)).unwrap_or_default();

    match prefix {
        "01" => IconKey::Clear,
        "02" => IconKey::Cloud,
        "03" | "04" => IconKey::Drizzle,
        "09" | "10" => IconKey::Rain,
        "13" => IconKey::Snow,
        _ => IconKey::Clear,
    }
}

/// Description used for WMO codes outside [`OPEN_METEO_CODES`].
pub const UNKNOWN_OPEN_METEO_DESCRIPTION: &str = "current weather";

/// WMO weather codes reported by Open-Meteo.
pub const OPEN_METEO_CODES: &[(i32, &str, IconKey)] = &[
    (0, "clear sky", IconKey::Clear),
    (1, "mainly clear", IconKey::Clear),
    (2, "partly cloudy", IconKey::Cloud),
    (3, "overcast", IconKey::Cloud),
    (45, "fog", IconKey::Cloud),
    (48, "depositing rime fog", IconKey::Cloud),
    (51, "light drizzle", IconKey::Drizzle),
    (53, "moderate drizzle", IconKey::Drizzle),
    (55, "dense drizzle", IconKey::Drizzle),
    (61, "slight rain", IconKey::Rain),
    (63, "moderate rain", IconKey::Rain),
    (65, "heavy rain", IconKey::Rain),
    (71, "slight snow", IconKey::Snow),
    (73, "moderate snow", IconKey::Snow),
    (75, "heavy snow", IconKey::Snow),
    (80, "rain showers", IconKey::Rain),
    (81, "heavy rain showers", IconKey::Rain),
    (82, "violent rain showers", IconKey::Rain),
    (85, "snow showers", IconKey::Snow),
    (86, "heavy snow showers", IconKey::Snow),
    (95, "thunderstorm", IconKey::Rain),
    (96, "thunderstorm (hail)", IconKey::Rain),
    (99, "thunderstorm (hail)", IconKey::Rain),
];

/// Description and icon for an Open-Meteo `weathercode`.
pub fn open_meteo_condition(code: i32) -> (&'static str, IconKey) {
    OPEN_METEO_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, desc, icon)| (*desc, *icon))
        .unwrap_or((UNKNOWN_OPEN_METEO_DESCRIPTION, IconKey::Clear))
}
