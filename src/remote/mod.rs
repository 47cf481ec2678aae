//! Published-spreadsheet fetch: a share URL is reduced to its document id
//! and converted into a direct export-as-xlsx download, pulled with one
//! unauthenticated GET. No retry and no backoff: a failure surfaces
//! immediately, carrying the export link so the user can download manually.

use crate::error::FetchError;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!("finsight/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pull the document id out of a share URL (the segment after `/d/`).
pub fn sheet_document_id(share_url: &str) -> Option<String> {
    let parsed = url::Url::parse(share_url).ok()?;
    let mut segments = parsed.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            let id: String = segments
                .next()?
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            return if id.is_empty() { None } else { Some(id) };
        }
    }
    None
}

/// Share URL → direct export-as-xlsx URL.
pub fn export_url(share_url: &str) -> Result<String, FetchError> {
    let id = sheet_document_id(share_url)
        .ok_or_else(|| FetchError::InvalidShareUrl(share_url.to_string()))?;
    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=xlsx",
        id
    ))
}

pub struct SheetFetcher {
    client: reqwest::Client,
}

impl SheetFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Download the workbook bytes behind a share URL. Fire-once.
    pub async fn fetch_workbook(&self, share_url: &str) -> Result<Vec<u8>, FetchError> {
        let export = export_url(share_url)?;
        info!("Fetching published sheet: {}", export);

        let response = self
            .client
            .get(&export)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                source: e,
                export_url: export.clone(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                export_url: export,
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            source: e,
            export_url: export.clone(),
        })?;
        Ok(bytes.to_vec())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
