//! Chess.com public API client: monthly archives and their PGNs.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::WorkerError;

const API_BASE: &str = "https://api.chess.com/pub/player";

pub struct ChessComClient {
    client: Client,
}

impl ChessComClient {
    pub fn new() -> Result<Self, WorkerError> {
        let client = Client::builder()
            .user_agent("ChessInsights/1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WorkerError::Archive(format!("HTTP client error: {e}")))?;
        Ok(Self { client })
    }

    /// Monthly archive URLs for `username`, oldest first.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<String>, WorkerError> {
        let url = format!("{API_BASE}/{}/games/archives", username.to_lowercase());
        let data = self.get_json(&url).await?;
        Ok(archive_urls(&data))
    }

    /// PGNs of the standard-chess games in one monthly archive.
    pub async fn fetch_games(&self, archive_url: &str) -> Result<Vec<String>, WorkerError> {
        // Rate limit
        tokio::time::sleep(Duration::from_millis(100)).await;
        let data = self.get_json(archive_url).await?;
        let pgns = standard_pgns(&data);
        debug!(archive_url, games = pgns.len(), "Fetched archive");
        Ok(pgns)
    }

    async fn get_json(&self, url: &str) -> Result<Value, WorkerError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WorkerError::Archive(format!("Request error for {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(WorkerError::Archive(format!("HTTP {} for {url}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| WorkerError::Archive(format!("Body read error for {url}: {e}")))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Archive URLs from an `/games/archives` response, sorted chronologically.
/// URLs end in `/YYYY/MM`, so lexical order is chronological.
pub fn archive_urls(data: &Value) -> Vec<String> {
    let mut urls: Vec<String> = data["archives"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    urls.sort();
    urls
}

/// PGN text of each standard game in an archive response. Variants are skipped.
pub fn standard_pgns(data: &Value) -> Vec<String> {
    data["games"]
        .as_array()
        .map(|games| {
            games
                .iter()
                .filter(|g| g.get("rules").and_then(|v| v.as_str()).unwrap_or("chess") == "chess")
                .filter_map(|g| g.get("pgn").and_then(|v| v.as_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
