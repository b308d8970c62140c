//! Search state machine behind the lookup widget.
//!
//! ```text
//! Idle -> Loading -> Loaded | Failed
//!            ^---------------'
//! ```
//!
//! The controller owns the only mutable slot (the current [`SearchState`]) and
//! forwards every transition to a [`WeatherView`]. Successful searches are
//! logged to a [`SearchLog`] from a detached task; the transition to `Loaded`
//! never waits for that write and its failures never reach the view.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{NormalizedWeather, SearchLogEntry},
    provider::WeatherProvider,
    search_log::SearchLog,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    /// Nothing searched yet, or cleared.
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Loaded(NormalizedWeather),
    Failed {
        message: String,
    },
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading { .. })
    }

    pub fn weather(&self) -> Option<&NormalizedWeather> {
        match self {
            SearchState::Loaded(weather) => Some(weather),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SearchState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Rendering collaborator. Called once per state transition.
pub trait WeatherView: Send {
    fn render(&mut self, state: &SearchState);
}

/// Handle for one started search. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Upper bound on [`SearchController::flush_log_writes`].
pub const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SearchController<V> {
    provider: Arc<dyn WeatherProvider>,
    log: Arc<dyn SearchLog>,
    view: V,
    state: SearchState,
    generation: u64,
    log_writes: Vec<JoinHandle<()>>,
}

impl<V: WeatherView> SearchController<V> {
    pub fn new(provider: Arc<dyn WeatherProvider>, log: Arc<dyn SearchLog>, mut view: V) -> Self {
        let state = SearchState::Idle;
        view.render(&state);

        Self {
            provider,
            log,
            view,
            state,
            generation: 0,
            log_writes: Vec::new(),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    /// Run one full search: start, fetch, settle.
    ///
    /// A blank query, or one submitted while another search is loading, leaves
    /// the state untouched.
    pub async fn search(&mut self, query: &str) -> &SearchState {
        let Some(ticket) = self.begin(query) else {
            return &self.state;
        };

        let result = self.provider.fetch_weather(ticket.query()).await;
        self.finish(ticket, result);

        &self.state
    }

    /// Enter `Loading` for `query`, dropping any previous result or error.
    ///
    /// Returns `None` (and changes nothing) for a blank query or while a
    /// search is already loading.
    pub fn begin(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            debug!("ignoring blank query");
            return None;
        }
        if self.state.is_loading() {
            debug!(query, "search already in flight, ignoring");
            return None;
        }

        self.generation += 1;
        info!(query, "searching");
        self.transition(SearchState::Loading { query: query.to_string() });

        Some(SearchTicket { generation: self.generation, query: query.to_string() })
    }

    /// Settle the search identified by `ticket`.
    ///
    /// Returns `false` when the ticket is stale and the result was discarded.
    /// Must be called from within a Tokio runtime: a successful result spawns
    /// the search-log write.
    pub fn finish(
        &mut self,
        ticket: SearchTicket,
        result: Result<NormalizedWeather, WeatherError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(query = %ticket.query, "discarding stale search result");
            return false;
        }

        match result {
            Ok(weather) => {
                let entry = SearchLogEntry::from_weather(&weather);
                info!(
                    location = %weather.location_label,
                    provider = %weather.provider,
                    "search loaded"
                );
                self.transition(SearchState::Loaded(weather));
                self.spawn_log_write(entry);
            }
            Err(err) => {
                info!(query = %ticket.query, error = %err, "search failed");
                self.transition(SearchState::Failed { message: err.user_message() });
            }
        }

        true
    }

    /// Back to `Idle`. A search still in flight is invalidated.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.transition(SearchState::Idle);
    }

    /// Wait up to [`LOG_FLUSH_TIMEOUT`] for detached search-log writes to
    /// settle. Never touches the state.
    pub async fn flush_log_writes(&mut self) {
        self.flush_log_writes_within(LOG_FLUSH_TIMEOUT).await;
    }

    /// Like [`flush_log_writes`](Self::flush_log_writes) with an explicit
    /// limit for all outstanding writes together. Writes still running when
    /// it expires are aborted.
    pub async fn flush_log_writes_within(&mut self, limit: Duration) {
        let deadline = Instant::now() + limit;

        for mut handle in self.log_writes.drain(..) {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "search log task did not complete"),
                Err(_) => {
                    handle.abort();
                    warn!(?limit, "search log write timed out, abandoning it");
                }
            }
        }
    }

    fn transition(&mut self, next: SearchState) {
        self.state = next;
        self.view.render(&self.state);
    }

    fn spawn_log_write(&mut self, entry: SearchLogEntry) {
        self.log_writes.retain(|handle| !handle.is_finished());

        let log = Arc::clone(&self.log);
        self.log_writes.push(tokio::spawn(async move {
            if let Err(e) = log.record(&entry).await {
                warn!(error = %e, city = %entry.city, "failed to record search");
            }
        }));
    }
}
