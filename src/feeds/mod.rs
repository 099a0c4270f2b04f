// src/feeds/mod.rs

//! Upstream phishing feed sources and the ingestion controller.
//!
//! Each source turns its provider-specific wire format into
//! [`FeedEntry`] values; the [`FeedIngestor`] drains every configured
//! source and cross-deduplicates the combined result, because
//! providers' coverage overlaps.

mod openphish;
mod phishtank;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, Sample};
use crate::store::SampleIndex;
use crate::utils::url::normalize;

pub use openphish::OpenphishFeed;
pub use phishtank::PhishtankFeed;

/// An entry produced by a feed source before it becomes a sample.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Provider-assigned id, or a stable derived one for feeds that
    /// assign none
    pub provider_id: String,

    /// Reported URL
    pub url: String,

    /// Name of the source that produced this entry
    pub feed: String,
}

/// Capability contract for an upstream feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Name identifying this feed in samples and logs.
    fn name(&self) -> &str;

    /// Fetch entries newer than the given offset, already deduplicated
    /// within the fetch and filtered against the sample index.
    ///
    /// Offset semantics are provider specific; sources without
    /// pagination ignore it.
    async fn fetch_new(&self, offset: Option<&str>) -> Result<Vec<FeedEntry>>;
}

/// Result of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Samples to process, in feed order
    pub samples: Vec<Sample>,

    /// Number of sources that failed this run
    pub feed_failures: usize,
}

/// Drains all configured feed sources into one deduplicated batch.
pub struct FeedIngestor {
    sources: Vec<Box<dyn FeedSource>>,
}

impl FeedIngestor {
    /// Build the ingestor from configuration; feeds with an empty URL
    /// are disabled.
    pub fn from_config(
        config: &Config,
        client: reqwest::Client,
        index: Arc<dyn SampleIndex>,
    ) -> Self {
        let mut sources: Vec<Box<dyn FeedSource>> = Vec::new();

        if !config.feeds.phishtank.url.is_empty() {
            sources.push(Box::new(PhishtankFeed::new(
                &config.feeds.phishtank,
                client.clone(),
                Arc::clone(&index),
            )));
        }

        if !config.feeds.openphish.url.is_empty() {
            sources.push(Box::new(OpenphishFeed::new(
                &config.feeds.openphish,
                client,
                index,
            )));
        }

        Self { sources }
    }

    /// Build the ingestor from explicit sources.
    pub fn new(sources: Vec<Box<dyn FeedSource>>) -> Self {
        Self { sources }
    }

    /// Run every source and produce one cross-deduplicated batch.
    ///
    /// A single source's failure is logged and counted but does not
    /// prevent the remaining sources from being processed.
    pub async fn fetch_all(&self) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for source in &self.sources {
            let entries = match source.fetch_new(None).await {
                Ok(entries) => entries,
                Err(error) => {
                    outcome.feed_failures += 1;
                    log::error!("Feed {} failed: {}", source.name(), error);
                    continue;
                }
            };

            let mut added = 0usize;
            let mut last_id = String::new();
            for entry in entries {
                if !seen.insert(normalize(&entry.url)) {
                    log::info!("URL {} appears in more than one feed", entry.url);
                    continue;
                }
                last_id = entry.provider_id.clone();
                outcome
                    .samples
                    .push(Sample::new(entry.provider_id, entry.url, entry.feed));
                added += 1;
            }

            if added > 0 {
                log::info!(
                    "Found {} {} samples with final provider id {}",
                    added,
                    source.name(),
                    last_id
                );
            } else {
                log::info!("No new samples found for {}", source.name());
            }
        }

        outcome
    }
}
