// src/collector/orchestrator.rs

//! Per-sample collection orchestrator.
//!
//! One processing pass per sample: page fetch, IP resolution, the
//! open-directory crawl, then exactly one terminal record in the sample
//! index — fully populated on success, degraded when anything in the
//! sequence failed. No failure here may propagate to sibling samples or
//! the scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::collector::{DirectoryCrawler, KitAcquirer};
use crate::error::{AppError, Result};
use crate::models::{Config, Sample};
use crate::store::{KitStore, SampleIndex};
use crate::utils::url::{deobfuscate_scheme, host_of};

/// Handles collecting phishing sites.
pub struct Collector {
    config: Arc<Config>,
    client: reqwest::Client,
    index: Arc<dyn SampleIndex>,
    crawler: DirectoryCrawler,
}

impl Collector {
    pub fn new(
        config: Arc<Config>,
        client: reqwest::Client,
        index: Arc<dyn SampleIndex>,
        kits: Arc<dyn KitStore>,
    ) -> Self {
        let acquirer = KitAcquirer::new(&config.collector, client.clone(), kits);
        let crawler = DirectoryCrawler::new(Arc::clone(&config), client.clone(), acquirer);
        Self {
            config,
            client,
            index,
            crawler,
        }
    }

    /// Process one sample to its terminal record.
    ///
    /// Any error from the collection sequence is absorbed here and
    /// converted into the degraded record, so every sample that enters
    /// produces exactly one index entry.
    pub async fn process(&self, mut sample: Sample) {
        if let Err(error) = self.collect(&mut sample).await {
            log::warn!("Processing failed for {}: {}", sample.url, error);
            sample.degrade();
            sample.timestamp = Utc::now();
            if let Err(error) = self.index.upsert(&sample).await {
                log::error!("Failed to record degraded sample {}: {}", sample.id, error);
            }
        }
    }

    /// Collect the data associated with a sample.
    async fn collect(&self, sample: &mut Sample) -> Result<()> {
        if let Some(host) = host_of(&sample.url) {
            if self.config.collector.blacklist.iter().any(|b| b == &host) {
                return Err(AppError::BlockedTarget(host));
            }
        }

        // Feeds report some URLs defanged as hxxp://...
        sample.url = deobfuscate_scheme(&sample.url);

        let (status_code, html) = self.fetch_page(&sample.url).await;
        sample.status_code = status_code;
        sample.html = html;
        sample.ip_address = self.lookup_ip(&sample.url).await;

        let outcome = self.crawler.crawl(sample).await;
        sample.indexing_enabled = outcome.indexing_enabled;
        sample.has_kit = !outcome.kits.is_empty();
        sample.kit_hashes = outcome.kits.into_iter().map(|k| k.hash).collect();

        sample.timestamp = Utc::now();
        self.index.upsert(sample).await
    }

    /// Fetch the sample page itself.
    ///
    /// Unreachable pages yield `(0, "")`; the rest of the pass still
    /// runs, since directory probing does not depend on the page.
    async fn fetch_page(&self, url: &str) -> (u16, String) {
        log::info!("Fetching {}", url);
        let timeout = Duration::from_secs(self.config.collector.page_timeout_secs);
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    log::debug!("Unsuccessful response for sample {}: {}", url, status);
                }
                let html = response.text().await.unwrap_or_default();
                (status.as_u16(), html)
            }
            Err(error) => {
                log::info!("No response for sample {}: {}", url, error);
                (0, String::new())
            }
        }
    }

    /// Resolve the IP address the sample's host points at, best effort.
    async fn lookup_ip(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let port = parsed.port_or_known_default().unwrap_or(80);
        let mut addrs = tokio::net::lookup_host((host, port)).await.ok()?;
        addrs.next().map(|addr| addr.ip().to_string())
    }
}
