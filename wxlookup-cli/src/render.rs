use chrono::{DateTime, Local, Utc};
use wxlookup_core::{IconKey, NormalizedWeather, SearchLogEntry, SearchState, WeatherView};

/// Terminal front-end for the search controller.
#[derive(Debug, Default)]
pub struct TerminalView {
    json: bool,
    idle_hint: bool,
}

impl TerminalView {
    /// Print results as JSON instead of a card.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Print a hint while nothing has been searched yet.
    pub fn idle_hint(mut self, idle_hint: bool) -> Self {
        self.idle_hint = idle_hint;
        self
    }
}

impl WeatherView for TerminalView {
    fn render(&mut self, state: &SearchState) {
        match state {
            SearchState::Idle if self.idle_hint => {
                println!("Start by searching for a city.");
            }
            SearchState::Idle => {}
            SearchState::Loading { query } if !self.json => {
                eprintln!("Fetching weather for {query}...");
            }
            SearchState::Loading { .. } => {}
            SearchState::Loaded(weather) if self.json => {
                match serde_json::to_string_pretty(weather) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Failed to serialize result: {e}"),
                }
            }
            SearchState::Loaded(weather) => println!("{}", format_card(weather)),
            SearchState::Failed { message } => eprintln!("⚠️  {message}"),
        }
    }
}

pub fn icon_glyph(icon: IconKey) -> &'static str {
    match icon {
        IconKey::Clear => "☀️",
        IconKey::Cloud => "☁️",
        IconKey::Drizzle => "🌦️",
        IconKey::Rain => "🌧️",
        IconKey::Snow => "❄️",
    }
}

/// Weather card; rows the provider did not report are left out.
pub fn format_card(weather: &NormalizedWeather) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "{}  {:.1}°C  {}",
        icon_glyph(weather.icon),
        weather.temperature_c,
        weather.location_label
    ));

    let mut summary = weather.description.clone();
    if let Some(feels) = weather.feels_like_c {
        if summary.is_empty() {
            summary = format!("feels like {feels:.1}°C");
        } else {
            summary.push_str(&format!(" • feels like {feels:.1}°C"));
        }
    }
    if !summary.is_empty() {
        lines.push(format!("    {summary}"));
    }

    if let Some(min) = weather.temp_min_c {
        lines.push(format!("    Temp min: {min:.1}°C"));
    }
    if let Some(max) = weather.temp_max_c {
        lines.push(format!("    Temp max: {max:.1}°C"));
    }
    if let Some(pressure) = weather.pressure_hpa {
        lines.push(format!("    Pressure: {pressure} hPa"));
    }
    if let Some(humidity) = weather.humidity_pct {
        lines.push(format!("    Humidity: {humidity}%"));
    }
    lines.push(format!("    Wind:     {} km/h", weather.wind_kmh));
    lines.push(format!("    Source:   {}", weather.provider));

    lines.join("\n")
}

/// "Friday, 16 October 2026"
pub fn format_date(now: DateTime<Local>) -> String {
    now.format("%A, %-d %B %Y").to_string()
}

pub fn format_history_row(entry: &SearchLogEntry) -> String {
    let when = entry
        .timestamp
        .map(|ts: DateTime<Utc>| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "                ".to_string());

    format!(
        "{when}  {}, {}  {:.1}°C  ({})",
        entry.city, entry.country_code, entry.temperature_c, entry.provider
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wxlookup_core::ProviderId;

    fn weather() -> NormalizedWeather {
        NormalizedWeather {
            provider: ProviderId::OpenMeteo,
            location_label: "Paris, FR".into(),
            city: "Paris".into(),
            country_code: "FR".into(),
            temperature_c: 18.2,
            feels_like_c: None,
            temp_min_c: None,
            temp_max_c: None,
            wind_kmh: 10,
            humidity_pct: None,
            pressure_hpa: None,
            description: "overcast".into(),
            icon: IconKey::Cloud,
        }
    }

    #[test]
    fn card_omits_absent_rows() {
        let card = format_card(&weather());

        assert!(card.contains("18.2°C  Paris, FR"));
        assert!(card.contains("overcast"));
        assert!(card.contains("Wind:     10 km/h"));
        assert!(!card.contains("feels like"));
        assert!(!card.contains("Humidity"));
        assert!(!card.contains("Pressure"));
        assert!(!card.contains("Temp min"));
    }

    #[test]
    fn card_shows_zero_values_that_were_reported() {
        let mut w = weather();
        w.provider = ProviderId::OpenWeather;
        w.temperature_c = 0.0;
        w.feels_like_c = Some(-2.5);
        w.temp_min_c = Some(0.0);
        w.humidity_pct = Some(0);
        w.pressure_hpa = Some(1013);

        let card = format_card(&w);

        assert!(card.contains("0.0°C  Paris, FR"));
        assert!(card.contains("overcast • feels like -2.5°C"));
        assert!(card.contains("Temp min: 0.0°C"));
        assert!(card.contains("Humidity: 0%"));
        assert!(card.contains("Pressure: 1013 hPa"));
        assert!(card.contains("Source:   openweather"));
    }

    #[test]
    fn date_header_format() {
        let date = Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        assert_eq!(format_date(date), "Friday, 16 October 2026");
    }

    #[test]
    fn history_row_without_timestamp() {
        let entry = SearchLogEntry {
            city: "Oslo".into(),
            country_code: "NO".into(),
            temperature_c: -3.5,
            provider: ProviderId::OpenWeather,
            timestamp: None,
        };

        let row = format_history_row(&entry);
        assert!(row.ends_with("Oslo, NO  -3.5°C  (openweather)"));
    }
}
