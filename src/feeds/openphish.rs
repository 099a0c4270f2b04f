// src/feeds/openphish.rs

//! OpenPhish free feed provider.
//!
//! The feed is a full dump: every line of the response body is a
//! reported URL, with no provider ids and no pagination.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::feeds::{FeedEntry, FeedSource};
use crate::models::OpenphishConfig;
use crate::store::SampleIndex;
use crate::utils::url::normalize;

pub const FEED_NAME: &str = "openphish";

/// Full-dump feed source.
pub struct OpenphishFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    index: Arc<dyn SampleIndex>,
}

impl OpenphishFeed {
    pub fn new(
        config: &OpenphishConfig,
        client: reqwest::Client,
        index: Arc<dyn SampleIndex>,
    ) -> Self {
        Self {
            client,
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            index,
        }
    }

    /// Derive a stable provider id for a URL.
    ///
    /// The feed assigns no ids of its own, so the digest of the URL
    /// guarantees the same URL maps to the same id across runs.
    fn provider_id(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    async fn process_rows(&self, body: &str) -> Result<Vec<FeedEntry>> {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for url in body.lines() {
            let url = url.trim();
            if url.is_empty() {
                continue;
            }
            let normalized = normalize(url);
            if seen.contains(&normalized) || self.index.exists(&normalized).await? {
                continue;
            }
            seen.insert(normalized);
            entries.push(FeedEntry {
                provider_id: Self::provider_id(url),
                url: url.to_string(),
                feed: FEED_NAME.to_string(),
            });
        }

        Ok(entries)
    }
}

#[async_trait]
impl FeedSource for OpenphishFeed {
    fn name(&self) -> &str {
        FEED_NAME
    }

    /// The offset is ignored: the upstream always serves the entire
    /// current feed.
    async fn fetch_new(&self, _offset: Option<&str>) -> Result<Vec<FeedEntry>> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::fetch(FEED_NAME, e))?;

        if !response.status().is_success() {
            return Err(AppError::fetch(
                FEED_NAME,
                format!("unexpected status {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(FEED_NAME, e))?;

        self.process_rows(&body).await
    }
}
