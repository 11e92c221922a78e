//! Jellyfin and Plex library refresh triggers
//!
//! Each trigger reads only its own section of [`MediaServerConfig`] and
//! returns `{"skipped": true}` without touching the network when that
//! server is disabled.
//!
//! - Jellyfin: `POST {url}/Library/Refresh?api_key={key}`
//! - Plex: `GET {url}/library/sections/{id}/refresh` per configured section,
//!   or `GET {url}/library/sections/all/refresh`, with `X-Plex-Token`

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{ScanError, ScanResult};
use crate::settings::MediaServerConfig;

/// Per-request timeout for refresh calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const JELLYFIN: &str = "Jellyfin";
const PLEX: &str = "Plex";
const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";
const ALL_SECTIONS: &str = "all";

/// Result of one Plex section refresh request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRefresh {
    pub section: String,
    pub status: u16,
}

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerOutcome {
    /// Server disabled; no request sent
    Skipped { skipped: bool },
    /// Refresh accepted by the server
    Triggered {
        triggered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sections: Option<Vec<SectionRefresh>>,
    },
}

impl TriggerOutcome {
    pub fn skipped() -> Self {
        Self::Skipped { skipped: true }
    }

    pub fn triggered() -> Self {
        Self::Triggered {
            triggered: true,
            sections: None,
        }
    }

    pub fn triggered_sections(sections: Vec<SectionRefresh>) -> Self {
        Self::Triggered {
            triggered: true,
            sections: Some(sections),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// HTTP client for media server refresh calls
#[derive(Clone)]
pub struct MediaServerClient {
    http_client: Client,
}

impl fmt::Debug for MediaServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaServerClient")
            .field("timeout", &REQUEST_TIMEOUT)
            .finish()
    }
}

impl MediaServerClient {
    /// Create a client with the fixed 30 second request timeout
    pub fn new() -> ScanResult<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Refresharr/1.0")
            .build()
            .map_err(|e| ScanError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Wrap an existing reqwest client (its timeout settings are kept)
    pub fn with_http_client(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Ask Jellyfin to refresh every library
    #[instrument(skip(self, config))]
    pub async fn trigger_jellyfin_scan(
        &self,
        config: &MediaServerConfig,
    ) -> ScanResult<TriggerOutcome> {
        let jellyfin = &config.jellyfin;
        if !jellyfin.enabled {
            debug!("Jellyfin disabled, skipping refresh");
            return Ok(TriggerOutcome::skipped());
        }

        let url = format!("{}/Library/Refresh", jellyfin.base_url());
        let response = self
            .http_client
            .post(&url)
            .query(&[("api_key", jellyfin.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ScanError::upstream_network(JELLYFIN, &e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ScanError::upstream_status(
                JELLYFIN,
                status,
                status.to_string(),
            ));
        }

        info!(status, "Jellyfin library refresh triggered");
        Ok(TriggerOutcome::triggered())
    }

    /// Ask Plex to refresh the configured sections, or all of them.
    ///
    /// Every section request is sent before statuses are checked; the error
    /// names the first section that failed.
    #[instrument(skip(self, config))]
    pub async fn trigger_plex_scan(&self, config: &MediaServerConfig) -> ScanResult<TriggerOutcome> {
        let plex = &config.plex;
        if !plex.enabled {
            debug!("Plex disabled, skipping refresh");
            return Ok(TriggerOutcome::skipped());
        }

        let base = plex.base_url();
        let mut sections = plex.section_ids();
        if sections.is_empty() {
            sections.push(ALL_SECTIONS.to_string());
        }

        let mut results = Vec::with_capacity(sections.len());
        for section in sections {
            let url = format!("{}/library/sections/{}/refresh", base, section);
            let response = self
                .http_client
                .get(&url)
                .header(PLEX_TOKEN_HEADER, plex.api_key.as_str())
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .map_err(|e| ScanError::upstream_network(PLEX, &e))?;

            let status = response.status().as_u16();
            debug!(section = %section, status, "Plex section refresh requested");
            results.push(SectionRefresh { section, status });
        }

        if let Some(failed) = results.iter().find(|r| r.status >= 400) {
            return Err(ScanError::upstream_status(
                PLEX,
                failed.status,
                format!("section {} status {}", failed.section, failed.status),
            ));
        }

        info!(sections = results.len(), "Plex library refresh triggered");
        Ok(TriggerOutcome::triggered_sections(results))
    }
}
