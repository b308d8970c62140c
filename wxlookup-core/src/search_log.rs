//! Append-only search history kept in a hosted document store.
//!
//! Writes are fire-and-forget from the controller's point of view; see
//! [`crate::controller`]. Reading back is only used by the `history` command.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{Value, json};
use std::fmt::Debug;

use crate::{
    config::SearchLogSettings, error::SearchLogError, model::SearchLogEntry, provider::ProviderId,
};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

#[async_trait]
pub trait SearchLog: Send + Sync + Debug {
    /// Append one entry. The store assigns the timestamp.
    async fn record(&self, entry: &SearchLogEntry) -> Result<(), SearchLogError>;

    /// Newest entries first, at most `max`.
    async fn recent(&self, max: usize) -> Result<Vec<SearchLogEntry>, SearchLogError>;
}

/// Sink used when no store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearchLog;

#[async_trait]
impl SearchLog for DisabledSearchLog {
    async fn record(&self, _entry: &SearchLogEntry) -> Result<(), SearchLogError> {
        Ok(())
    }

    async fn recent(&self, _max: usize) -> Result<Vec<SearchLogEntry>, SearchLogError> {
        Ok(Vec::new())
    }
}

/// Cloud Firestore over its REST API.
///
/// Documents carry `city`, `country`, `temp`, `source` and a server-set
/// `createdAt`. `source` uses the store's own provider tags (`owm`,
/// `open-meteo`), see [`store_tag`].
#[derive(Debug, Clone)]
pub struct FirestoreSearchLog {
    http: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    collection: String,
}

impl FirestoreSearchLog {
    pub fn new(settings: &SearchLogSettings, http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            collection: settings.collection.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/{}:{}", self.base_url, self.database_path(), method)
    }

    fn post(&self, method: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut request = self.http.post(self.endpoint(method)).json(body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        request
    }

    fn commit_body(&self, entry: &SearchLogEntry, document_id: &str) -> Value {
        json!({
            "writes": [{
                "update": {
                    "name": format!("{}/{}/{}", self.database_path(), self.collection, document_id),
                    "fields": {
                        "city": { "stringValue": entry.city },
                        "country": { "stringValue": entry.country_code },
                        "temp": { "doubleValue": entry.temperature_c },
                        "source": { "stringValue": store_tag(entry.provider) },
                    }
                },
                "updateTransforms": [{
                    "fieldPath": "createdAt",
                    "setToServerValue": "REQUEST_TIME"
                }],
                "currentDocument": { "exists": false }
            }]
        })
    }

    fn recent_query_body(&self, max: usize) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "orderBy": [{
                    "field": { "fieldPath": "createdAt" },
                    "direction": "DESCENDING"
                }],
                "limit": max
            }
        })
    }
}

#[async_trait]
impl SearchLog for FirestoreSearchLog {
    async fn record(&self, entry: &SearchLogEntry) -> Result<(), SearchLogError> {
        let document_id = uuid::Uuid::new_v4().simple().to_string();
        let body = self.commit_body(entry, &document_id);

        let res = self.post("commit", &body).send().await?;
        ensure_success(res).await?;

        tracing::debug!(city = %entry.city, %document_id, "search recorded");
        Ok(())
    }

    async fn recent(&self, max: usize) -> Result<Vec<SearchLogEntry>, SearchLogError> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let res = self.post("runQuery", &self.recent_query_body(max)).send().await?;
        let res = ensure_success(res).await?;

        let rows: Vec<Value> = res.json().await.map_err(|e| SearchLogError::Decode(e.to_string()))?;

        // runQuery streams one element per document; an empty result is a
        // single element with only `readTime`.
        let entries = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .filter_map(|doc| match decode_document(doc) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let name = doc.get("name").and_then(Value::as_str).unwrap_or("?");
                    tracing::warn!(
                        error = %e,
                        document = name,
                        "skipping unreadable search record"
                    );
                    None
                }
            })
            .collect();

        Ok(entries)
    }
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, SearchLogError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or(body);

    Err(SearchLogError::Store { status: status.as_u16(), message })
}

fn decode_document(document: &Value) -> Result<SearchLogEntry, SearchLogError> {
    let fields = document
        .get("fields")
        .ok_or_else(|| SearchLogError::Decode("document without fields".into()))?;

    let string_field = |name: &str| -> Result<String, SearchLogError> {
        fields
            .pointer(&format!("/{name}/stringValue"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SearchLogError::Decode(format!("missing string field '{name}'")))
    };

    let source = string_field("source")?;
    let provider = provider_from_tag(&source)
        .ok_or_else(|| SearchLogError::Decode(format!("unknown source '{source}'")))?;

    let timestamp = fields
        .pointer("/createdAt/timestampValue")
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    Ok(SearchLogEntry {
        city: string_field("city")?,
        country_code: string_field("country")?,
        temperature_c: number_field(fields, "temp")?,
        provider,
        timestamp,
    })
}

/// Tag written to the `source` field.
pub fn store_tag(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenWeather => "owm",
        ProviderId::OpenMeteo => "open-meteo",
    }
}

/// Inverse of [`store_tag`]. Also accepts the provider's CLI name.
fn provider_from_tag(tag: &str) -> Option<ProviderId> {
    if tag.trim().eq_ignore_ascii_case("owm") {
        return Some(ProviderId::OpenWeather);
    }
    ProviderId::try_from(tag.trim()).ok()
}

/// Firestore encodes integers as decimal strings and doubles as numbers.
fn number_field(fields: &Value, name: &str) -> Result<f64, SearchLogError> {
    let field = fields.get(name);

    let double = field.and_then(|f| f.get("doubleValue")).and_then(Value::as_f64);
    let integer = field
        .and_then(|f| f.get("integerValue"))
        .and_then(|v| v.as_str().and_then(|s| s.parse::<f64>().ok()).or_else(|| v.as_f64()));

    double
        .or(integer)
        .ok_or_else(|| SearchLogError::Decode(format!("missing numeric field '{name}'")))
}

/// Sink selected by the configuration.
pub fn search_log_from_settings(
    settings: Option<&SearchLogSettings>,
    http: Client,
) -> Box<dyn SearchLog> {
    match settings {
        Some(settings) if !settings.project_id.trim().is_empty() => {
            Box::new(FirestoreSearchLog::new(settings, http))
        }
        _ => Box::new(DisabledSearchLog),
    }
}
