//! MangaDex API client.
//!
//! Uses the public listing and author endpoints. No API key is required,
//! but MangaDex insists on a distinctive User-Agent and throttles hard at
//! around 5 requests per second.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{AuthorEntry, CatalogPage, PageQuery, PassFilter, RawRecord};
use super::{CatalogSource, SourceError};

fn default_base_url() -> String {
    "https://api.mangadex.org".to_string()
}

fn default_user_agent() -> String {
    format!("mangawatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

/// MangaDex API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangadexConfig {
    /// Base URL (default: https://api.mangadex.org).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MangadexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// MangaDex API client.
pub struct MangadexClient {
    client: Client,
    base_url: String,
}

impl MangadexClient {
    /// Create a new MangaDex client.
    pub fn new(config: MangadexConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    async fn list_request(&self, query: &PageQuery) -> Result<MangaListResponse, SourceError> {
        let url = format!("{}/manga", self.base_url);

        debug!(
            "MangaDex list: limit={}, offset={}, since={:?}, filter={}",
            query.limit,
            query.offset,
            query.created_at_since,
            query.filter.label()
        );

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("limit", query.limit.to_string()),
                ("offset", query.offset.to_string()),
            ])
            .query(&[
                ("order[createdAt]", "asc"),
                ("includes[]", "author"),
                ("includes[]", "cover_art"),
            ]);

        if let Some(since) = &query.created_at_since {
            request = request.query(&[("createdAtSince", since)]);
        }
        for rating in &query.filter.content_ratings {
            request = request.query(&[("contentRating[]", rating)]);
        }
        for demographic in &query.filter.demographics {
            request = request.query(&[("publicationDemographic[]", demographic)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 429 {
            return Err(SourceError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse manga list response: {}", e))
        })
    }
}

#[async_trait]
impl CatalogSource for MangadexClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<CatalogPage, SourceError> {
        let response = self.list_request(query).await?;

        Ok(CatalogPage {
            records: response.data,
            limit: response.limit,
            offset: response.offset,
            total: response.total,
        })
    }

    async fn fetch_authors(&self, ids: &[String]) -> Result<Vec<AuthorEntry>, SourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/author", self.base_url);

        debug!("MangaDex author lookup: {} ids", ids.len());

        let mut request = self
            .client
            .get(&url)
            .query(&[("limit", ids.len().to_string())]);
        for id in ids {
            request = request.query(&[("ids[]", id)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 429 {
            return Err(SourceError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let author_list: AuthorListResponse = response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse author response: {}", e))
        })?;

        Ok(author_list
            .data
            .into_iter()
            .filter_map(|a| {
                let name = a.attributes?.name?;
                Some(AuthorEntry { id: a.id, name })
            })
            .collect())
    }

    async fn total_available(&self, filter: &PassFilter) -> Result<u64, SourceError> {
        let query = PageQuery {
            limit: 1,
            offset: 0,
            created_at_since: None,
            filter: filter.clone(),
        };
        let response = self.list_request(&query).await?;
        Ok(response.total)
    }
}

// ============================================================================
// MangaDex API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MangaListResponse {
    #[serde(default)]
    data: Vec<RawRecord>,
    #[serde(default)]
    limit: u32,
    #[serde(default)]
    offset: u32,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct AuthorListResponse {
    #[serde(default)]
    data: Vec<AuthorResult>,
}

#[derive(Debug, Deserialize)]
struct AuthorResult {
    id: String,
    #[serde(default)]
    attributes: Option<AuthorAttributes>,
}

#[derive(Debug, Deserialize)]
struct AuthorAttributes {
    #[serde(default)]
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: MangadexConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_url, "https://api.mangadex.org");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("mangawatch/"));
    }

    #[test]
    fn test_list_response_parses_envelope() {
        let json = r#"{
            "result": "ok",
            "response": "collection",
            "data": [{"id": "m1", "type": "manga"}],
            "limit": 100,
            "offset": 200,
            "total": 54321
        }"#;

        let response: MangaListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.offset, 200);
        assert_eq!(response.total, 54321);
    }

    #[test]
    fn test_author_response_skips_nameless_entries() {
        let json = r#"{
            "data": [
                {"id": "a1", "attributes": {"name": "Kentaro Miura"}},
                {"id": "a2", "attributes": {}},
                {"id": "a3"}
            ]
        }"#;

        let response: AuthorListResponse = serde_json::from_str(json).unwrap();
        let entries: Vec<AuthorEntry> = response
            .data
            .into_iter()
            .filter_map(|a| {
                let name = a.attributes?.name?;
                Some(AuthorEntry { id: a.id, name })
            })
            .collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Kentaro Miura");
    }
}
