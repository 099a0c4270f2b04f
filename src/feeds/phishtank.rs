// src/feeds/phishtank.rs

//! Phishtank feed provider.
//!
//! The upstream is paginated by provider id: requests carry a `last`
//! offset and the response's first line reports the maximum id known to
//! the server. A single response page may be truncated short of that
//! maximum, so fetching advances the offset page by page until the last
//! entry id converges with the server maximum.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::feeds::{FeedEntry, FeedSource};
use crate::models::PhishtankConfig;
use crate::store::SampleIndex;
use crate::utils::url::normalize;

pub const FEED_NAME: &str = "phishtank";

/// Upper bound on offset-advance iterations per fetch.
const MAX_PAGES: usize = 32;

/// Paginated feed source.
pub struct PhishtankFeed {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
    default_offset: String,
    timeout: Duration,
    index: Arc<dyn SampleIndex>,
}

/// One parsed response page.
#[derive(Debug, PartialEq, Eq)]
struct FeedPage {
    /// Maximum provider id the server currently knows
    max_id: String,

    /// `(provider_id, url)` rows, newest-relevant-first
    rows: Vec<(String, String)>,
}

impl PhishtankFeed {
    pub fn new(
        config: &PhishtankConfig,
        client: reqwest::Client,
        index: Arc<dyn SampleIndex>,
    ) -> Self {
        Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            default_offset: config.last_seen.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            index,
        }
    }

    /// Parse one response body.
    ///
    /// Line 1 is the server's maximum id, line 2 a marker, and the rest
    /// tab-separated `(provider_id, url)` rows. Returns `None` when the
    /// response is just the header (no new entries); fewer than two
    /// lines is a malformed response.
    fn parse_response(body: &str) -> Result<Option<FeedPage>> {
        let lines: Vec<&str> = body.lines().collect();
        if lines.len() < 2 {
            return Err(AppError::fetch(
                FEED_NAME,
                format!("short response ({} lines)", lines.len()),
            ));
        }
        if lines.len() == 2 {
            return Ok(None);
        }

        let max_id = lines[0].trim().to_string();
        let mut rows = Vec::new();
        for line in &lines[2..] {
            let mut fields = line.split('\t');
            let (Some(pid), Some(url)) = (fields.next(), fields.next()) else {
                continue;
            };
            let (pid, url) = (pid.trim(), url.trim());
            if pid.is_empty() || url.is_empty() {
                continue;
            }
            rows.push((pid.to_string(), url.to_string()));
        }

        Ok(Some(FeedPage { max_id, rows }))
    }

    /// Resolve the starting offset: explicit argument, then the most
    /// recent indexed sample for this feed, then the configured cold
    /// start value.
    async fn resolve_offset(&self, offset: Option<&str>) -> Result<String> {
        if let Some(offset) = offset {
            return Ok(offset.to_string());
        }
        if let Some(recent) = self.index.most_recent(FEED_NAME).await? {
            return Ok(recent.id);
        }
        Ok(self.default_offset.clone())
    }

    async fn fetch_page(&self, offset: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .query(&[("last", offset)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| AppError::fetch(FEED_NAME, e))?;

        if !response.status().is_success() {
            return Err(AppError::fetch(
                FEED_NAME,
                format!("unexpected status {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::fetch(FEED_NAME, e))
    }
}

#[async_trait]
impl FeedSource for PhishtankFeed {
    fn name(&self) -> &str {
        FEED_NAME
    }

    async fn fetch_new(&self, offset: Option<&str>) -> Result<Vec<FeedEntry>> {
        let mut offset = self.resolve_offset(offset).await?;
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for _ in 0..MAX_PAGES {
            log::info!("Fetching {} feed with offset {}", FEED_NAME, offset);
            let body = self.fetch_page(&offset).await?;

            let Some(page) = Self::parse_response(&body)? else {
                break;
            };
            let Some(last_id) = page.rows.last().map(|(pid, _)| pid.clone()) else {
                break;
            };

            for (pid, url) in page.rows {
                let normalized = normalize(&url);
                if seen.contains(&normalized) || self.index.exists(&normalized).await? {
                    continue;
                }
                seen.insert(normalized);
                entries.push(FeedEntry {
                    provider_id: pid,
                    url,
                    feed: FEED_NAME.to_string(),
                });
            }

            if last_id == page.max_id {
                break;
            }
            log::info!(
                "Feed {} page truncated: server max {} reached {}, advancing",
                FEED_NAME,
                page.max_id,
                last_id
            );
            offset = last_id;
        }

        Ok(entries)
    }
}
