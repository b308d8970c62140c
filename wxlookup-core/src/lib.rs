//! Core library for the `wxlookup` CLI.
//!
//! This crate defines:
//! - Configuration and the startup choice of weather provider
//! - Two provider adapters (OpenWeather, Open-Meteo) that geocode a city and
//!   normalize its current conditions into one [`NormalizedWeather`] shape
//! - Static condition-code tables
//! - The search state machine and the hosted search-history sink
//!
//! It is used by `wxlookup-cli`, but can also be reused by other front-ends.

pub mod conditions;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod search_log;

pub use config::{Config, ProviderConfig, SearchLogSettings};
pub use controller::{SearchController, SearchState, SearchTicket, WeatherView};
pub use error::{SearchLogError, WeatherError};
pub use model::{GeocodedPlace, IconKey, NormalizedWeather, SearchLogEntry};
pub use provider::{ProviderId, WeatherProvider};
pub use search_log::SearchLog;
