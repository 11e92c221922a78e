//! Media server settings: model, defaults, merging and validation
//!
//! Settings live in the `mediaServers` section of the main settings
//! document. Reads merge the stored section onto built-in defaults so a
//! partially written section still yields a complete [`MediaServerConfig`].
//! Writes replace the whole section after [`validate_media_server_config`]
//! accepts it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ValidationError;
use crate::store::ConfigStore;

/// Key of the media server section inside the settings document
pub const MEDIA_SERVERS_KEY: &str = "mediaServers";

/// Smallest accepted interval between periodic scans
pub const MIN_INTERVAL_SECONDS: i64 = 60;

/// Interval used when none is stored
pub const DEFAULT_INTERVAL_SECONDS: i64 = 3600;

/// Connection settings for one media server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL, e.g. `http://jellyfin:8096`
    #[serde(default)]
    pub url: String,

    /// Jellyfin API key or Plex token
    #[serde(default)]
    pub api_key: String,

    /// Comma-separated Plex library section ids; empty means all sections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_section_ids: Option<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("library_section_ids", &self.library_section_ids)
            .finish()
    }
}

impl ServerConfig {
    /// Built-in Jellyfin defaults (disabled)
    pub fn jellyfin_default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            api_key: String::new(),
            library_section_ids: None,
        }
    }

    /// Built-in Plex defaults (disabled, all sections)
    pub fn plex_default() -> Self {
        Self {
            library_section_ids: Some(String::new()),
            ..Self::jellyfin_default()
        }
    }

    /// URL with surrounding whitespace and trailing slashes removed
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }

    /// Parsed section ids: split on commas, trimmed, empties dropped
    pub fn section_ids(&self) -> Vec<String> {
        self.library_section_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Overlay the fields present in `stored`; absent or mistyped fields keep
    /// their current value.
    fn merge_from(&mut self, stored: &Map<String, Value>) {
        if let Some(enabled) = stored.get("enabled") {
            self.enabled = truthy(enabled);
        }
        if let Some(url) = stored.get("url").and_then(string_or_empty) {
            self.url = url;
        }
        if let Some(api_key) = stored.get("apiKey").and_then(string_or_empty) {
            self.api_key = api_key;
        }
        if let Some(ids) = stored.get("librarySectionIds").and_then(string_or_empty) {
            self.library_section_ids = Some(ids);
        }
    }
}

/// The `mediaServers` settings section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaServerConfig {
    pub jellyfin: ServerConfig,
    pub plex: ServerConfig,

    /// Seconds between periodic scans (>= 60)
    pub interval_seconds: i64,

    /// Whether the periodic scan runs
    pub interval_enabled: bool,

    /// Whether a scan fires once the download queue drains
    pub trigger_on_queue_empty: bool,

    /// Unknown top-level keys, kept so they round-trip untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MediaServerConfig {
    fn default() -> Self {
        Self {
            jellyfin: ServerConfig::jellyfin_default(),
            plex: ServerConfig::plex_default(),
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            interval_enabled: false,
            trigger_on_queue_empty: false,
            extra: Map::new(),
        }
    }
}

impl MediaServerConfig {
    /// Merge a stored `mediaServers` section onto the defaults.
    ///
    /// `jellyfin` and `plex` merge field by field. Every other key replaces
    /// the default wholesale. Anything that is not an object yields the
    /// defaults.
    pub fn from_section(section: Option<&Value>) -> Self {
        let mut merged = Self::default();
        let Some(Value::Object(stored)) = section else {
            return merged;
        };

        for (key, value) in stored {
            match key.as_str() {
                "jellyfin" | "plex" => {
                    let Value::Object(fields) = value else {
                        continue;
                    };
                    let server = if key == "jellyfin" {
                        &mut merged.jellyfin
                    } else {
                        &mut merged.plex
                    };
                    server.merge_from(fields);
                }
                "intervalSeconds" => {
                    if let Ok(seconds) = coerce_interval(value) {
                        merged.interval_seconds = seconds;
                    }
                }
                "intervalEnabled" => merged.interval_enabled = truthy(value),
                "triggerOnQueueEmpty" => merged.trigger_on_queue_empty = truthy(value),
                _ => {
                    merged.extra.insert(key.clone(), value.clone());
                }
            }
        }

        merged
    }

    /// Extract and merge the `mediaServers` section of a settings document
    pub fn from_document(document: &Value) -> Self {
        Self::from_section(document.get(MEDIA_SERVERS_KEY))
    }
}

/// Read the media server settings from `store`, falling back to defaults
/// when the document cannot be loaded.
pub async fn get_media_server_config(store: &dyn ConfigStore) -> MediaServerConfig {
    match store.get_config().await {
        Ok(document) => MediaServerConfig::from_document(&document),
        Err(e) => {
            warn!(error = %e, "Failed to load settings document, using media server defaults");
            MediaServerConfig::default()
        }
    }
}

/// Validate a raw `mediaServers` body before it is persisted.
///
/// Rules are checked in order and the first failure wins:
/// `intervalSeconds` must coerce to an integer >= 60, then each enabled
/// server (Jellyfin first) needs an `http://` or `https://` URL and an API
/// key.
pub fn validate_media_server_config(raw: &Value) -> Result<(), ValidationError> {
    let Value::Object(body) = raw else {
        return Err(ValidationError::new(
            "Validation error: media server settings must be a JSON object",
        ));
    };

    let interval_seconds = match body.get("intervalSeconds") {
        Some(value) => coerce_interval(value)?,
        None => DEFAULT_INTERVAL_SECONDS,
    };
    if interval_seconds < MIN_INTERVAL_SECONDS {
        return Err(ValidationError::new(format!(
            "intervalSeconds must be >= {}",
            MIN_INTERVAL_SECONDS
        )));
    }

    for server_key in ["jellyfin", "plex"] {
        let server = match body.get(server_key) {
            None => continue,
            Some(Value::Object(server)) => server,
            // Falsy values ("", [], false, 0) read as an absent section
            Some(value) if !truthy(value) => continue,
            Some(_) => {
                return Err(ValidationError::new(format!(
                    "Validation error: {} must be an object",
                    server_key
                )))
            }
        };

        if !server.get("enabled").map(truthy).unwrap_or(false) {
            continue;
        }

        let url = server.get("url").and_then(Value::as_str).unwrap_or("").trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::new(format!(
                "{} url must start with http:// or https://",
                server_key
            )));
        }

        if !server.get("apiKey").map(truthy).unwrap_or(false) {
            return Err(ValidationError::new(format!(
                "{} apiKey required when enabled",
                server_key
            )));
        }
    }

    Ok(())
}

/// `(ok, message)` view of [`validate_media_server_config`]; the message is
/// empty on success.
pub fn validation_outcome(raw: &Value) -> (bool, String) {
    match validate_media_server_config(raw) {
        Ok(()) => (true, String::new()),
        Err(e) => (false, e.0),
    }
}

/// Loose integer coercion for `intervalSeconds`: integers, finite floats
/// (truncated), booleans and numeric strings.
fn coerce_interval(value: &Value) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::new("Validation error: intervalSeconds must be an integer");

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(invalid)
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// JSON truthiness: null, false, 0, "" and empty containers are false
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Strings pass through, null becomes empty, other types are rejected
fn string_or_empty(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
