use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, InquireError, Text};
use wxlookup_core::{
    Config, ProviderConfig, SearchController, SearchLogSettings, SearchState, WeatherView,
    config::DEFAULT_SEARCH_COLLECTION,
    provider::{http_client, provider_from_config},
    search_log::search_log_from_settings,
};

use crate::render::{self, TerminalView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxlookup", version, about = "Current weather for a city")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather key and the optional search history store.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "Paris" or "Springfield, US".
        city: String,

        /// Print the normalized result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search repeatedly until an empty line or Esc.
    Prompt,

    /// List recent searches from the history store.
    History {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => show(&city, json).await,
            Command::Prompt => prompt().await,
            Command::History { limit } => history(limit).await,
        }
    }
}

fn build_controller(
    config: &Config,
    view: TerminalView,
) -> anyhow::Result<SearchController<TerminalView>> {
    let http = http_client(config)?;
    let provider = provider_from_config(&config.provider_config(), http.clone());
    let log = search_log_from_settings(config.search_log.as_ref(), http);

    tracing::debug!(provider = %provider.id(), "provider selected");
    Ok(SearchController::new(Arc::from(provider), Arc::from(log), view))
}

async fn show(city: &str, json: bool) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    let mut controller = build_controller(&config, TerminalView::default().json(json))?;

    let failed = search_once(&mut controller, city).await;
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// One search, then wait for its log write. Returns `true` when it failed.
///
/// A blank city leaves the controller idle and is not a failure.
async fn search_once<V: WeatherView>(controller: &mut SearchController<V>, city: &str) -> bool {
    let failed = match controller.search(city).await {
        SearchState::Failed { .. } => true,
        SearchState::Idle => {
            eprintln!("Nothing to search for.");
            false
        }
        _ => false,
    };

    controller.flush_log_writes().await;
    failed
}

async fn prompt() -> anyhow::Result<ExitCode> {
    let config = Config::load()?;

    println!("{}", render::format_date(chrono::Local::now()));
    match config.provider_config() {
        ProviderConfig::OpenWeather { .. } => println!("Using OpenWeather."),
        ProviderConfig::OpenMeteo => println!("Using Open-Meteo (no API key configured)."),
    }

    let mut controller = build_controller(&config, TerminalView::default().idle_hint(true))?;

    loop {
        let city = match Text::new("City:")
            .with_help_message("Enter to search, empty line or Esc to quit")
            .prompt()
        {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city"),
        };

        if city.trim().is_empty() {
            break;
        }

        controller.search(&city).await;
    }

    controller.flush_log_writes().await;
    Ok(ExitCode::SUCCESS)
}

async fn history(limit: usize) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;

    if config.search_log.is_none() {
        println!("Search history is not configured.\nHint: run `wxlookup configure` to set it up.");
        return Ok(ExitCode::SUCCESS);
    }

    let log = search_log_from_settings(config.search_log.as_ref(), http_client(&config)?);
    let entries = log
        .recent(limit)
        .await
        .context("Failed to read search history")?;

    if entries.is_empty() {
        println!("No searches recorded yet.");
    }
    for entry in &entries {
        println!("{}", render::format_history_row(entry));
    }

    Ok(ExitCode::SUCCESS)
}

fn configure() -> anyhow::Result<ExitCode> {
    // Read the file as-is so an environment override is not written back.
    let mut config = Config::load_from(&Config::config_file_path()?)?;

    let current_key = config.openweather.api_key.clone().unwrap_or_default();
    let key = Text::new("OpenWeather API key:")
        .with_initial_value(&current_key)
        .with_help_message("Leave blank to use the keyless Open-Meteo service")
        .prompt()?;
    config.set_openweather_api_key(Some(key));

    let enable_log = Confirm::new("Record searches in a Firestore project?")
        .with_default(config.search_log.is_some())
        .prompt()?;

    config.search_log = if enable_log {
        let existing = config.search_log.clone();

        let project_id = Text::new("Firestore project id:")
            .with_initial_value(
                existing
                    .as_ref()
                    .map(|s| s.project_id.as_str())
                    .unwrap_or_default(),
            )
            .prompt()?;
        let api_key = Text::new("Firebase web API key:")
            .with_initial_value(
                existing
                    .as_ref()
                    .and_then(|s| s.api_key.as_deref())
                    .unwrap_or_default(),
            )
            .with_help_message("Optional")
            .prompt()?;
        let collection = Text::new("Collection:")
            .with_default(
                existing
                    .as_ref()
                    .map(|s| s.collection.as_str())
                    .unwrap_or(DEFAULT_SEARCH_COLLECTION),
            )
            .prompt()?;

        let project_id = project_id.trim().to_string();
        if project_id.is_empty() {
            println!("No project id given; search history stays disabled.");
            None
        } else {
            Some(SearchLogSettings {
                project_id,
                api_key: Some(api_key.trim().to_string()).filter(|k| !k.is_empty()),
                collection: collection.trim().to_string(),
            })
        }
    } else {
        None
    };

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    match config.provider_config() {
        ProviderConfig::OpenWeather { .. } => println!("Searches will use OpenWeather."),
        ProviderConfig::OpenMeteo => println!("Searches will use Open-Meteo."),
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_json() {
        let cli = Cli::try_parse_from(["wxlookup", "show", "Paris", "--json"]).unwrap();
        match cli.command {
            Command::Show { city, json } => {
                assert_eq!(city, "Paris");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn history_limit_defaults_to_five() {
        let cli = Cli::try_parse_from(["wxlookup", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { limit: 5 }));
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["wxlookup", "prompt", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[derive(Default)]
    struct Frames(Vec<SearchState>);

    impl WeatherView for Frames {
        fn render(&mut self, state: &SearchState) {
            self.0.push(state.clone());
        }
    }

    #[tokio::test]
    async fn blank_city_stays_idle_and_succeeds() {
        use wxlookup_core::{
            provider::openmeteo::OpenMeteoProvider, search_log::DisabledSearchLog,
        };

        // Nothing listens here; any request would end in a failed search.
        let unreachable = "http://127.0.0.1:9";
        let provider = OpenMeteoProvider::new().with_base_urls(unreachable, unreachable);
        let mut controller = SearchController::new(
            Arc::new(provider),
            Arc::new(DisabledSearchLog),
            Frames::default(),
        );

        assert!(!search_once(&mut controller, "   ").await);
        assert_eq!(controller.state(), &SearchState::Idle);
        assert_eq!(controller.view().0, vec![SearchState::Idle]);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
