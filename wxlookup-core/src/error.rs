use thiserror::Error;

/// Failure of a single weather lookup. Every variant ends the call; there are
/// no partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The geocoder returned no match for the query.
    #[error("City not found: \"{query}\"")]
    PlaceNotFound { query: String },

    /// No response from the provider (connection, DNS, timeout, truncated body).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered, but with a non-success status or a body we could not use.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl WeatherError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider(message.into())
    }

    /// Message shown to the user in place of the weather card.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::PlaceNotFound { query } => {
                format!("City not found: \"{query}\". Check the spelling and try again.")
            }
            WeatherError::Network(msg) => {
                format!("Could not reach the weather service ({msg}). Check your connection.")
            }
            WeatherError::Provider(msg) if msg.is_empty() => {
                "The weather service returned an unexpected response.".to_string()
            }
            WeatherError::Provider(msg) => msg.clone(),
        }
    }
}

/// Failure writing to or reading from the hosted search history.
///
/// Write failures never reach the user; they are logged and dropped.
#[derive(Debug, Error)]
pub enum SearchLogError {
    #[error("search log unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("search log rejected request with status {status}: {message}")]
    Store { status: u16, message: String },

    #[error("could not decode search log response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_not_found_mentions_query() {
        let err = WeatherError::PlaceNotFound { query: "Atlantis".into() };
        assert!(err.user_message().contains("Atlantis"));
        assert_eq!(err.to_string(), "City not found: \"Atlantis\"");
    }

    #[test]
    fn provider_message_is_passed_through() {
        let err = WeatherError::provider("Invalid API key");
        assert_eq!(err.user_message(), "Invalid API key");
    }

    #[test]
    fn user_message_is_never_empty() {
        let errors = [
            WeatherError::PlaceNotFound { query: String::new() },
            WeatherError::network(""),
            WeatherError::provider(""),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{err:?}");
        }
    }
}
