// src/collector/kits.rs

//! Kit acquisition engine.
//!
//! Downloads a candidate archive, hashing it incrementally while the
//! body streams to disk, and records the result in the kit store. A URL
//! already present in the store is returned without any network access,
//! so re-crawling the same site is cheap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{CollectorConfig, PhishKit};
use crate::store::KitStore;

/// Downloads and records kit archives.
pub struct KitAcquirer {
    client: reqwest::Client,
    store: Arc<dyn KitStore>,
    kit_directory: PathBuf,
    timeout: Duration,
}

impl KitAcquirer {
    pub fn new(
        config: &CollectorConfig,
        client: reqwest::Client,
        store: Arc<dyn KitStore>,
    ) -> Self {
        Self {
            client,
            store,
            kit_directory: PathBuf::from(&config.kit_directory),
            timeout: Duration::from_secs(config.kit_timeout_secs),
        }
    }

    /// Attempt to fetch a kit archive from `url` for the given sample.
    ///
    /// Every failure mode — bad status, HTML masquerading as an
    /// archive, network or disk errors — yields `None`; acquisition
    /// never aborts the enclosing crawl.
    pub async fn acquire(&self, url: &str, sample_id: &str) -> Option<PhishKit> {
        match self.try_acquire(url, sample_id).await {
            Ok(kit) => kit,
            Err(error) => {
                log::info!("Kit download failed for {}: {}", url, error);
                None
            }
        }
    }

    async fn try_acquire(&self, url: &str, sample_id: &str) -> Result<Option<PhishKit>> {
        if let Some(existing) = self.store.find_by_url(url).await? {
            log::info!("Kit already recorded for {}", url);
            return Ok(Some(existing));
        }

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            log::debug!(
                "Invalid response for zip URL {}: {}",
                url,
                response.status()
            );
            return Ok(None);
        }

        // Some hosts answer every path with an HTML error page and a
        // 200. An archive served as text/html is one of those.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));
        if is_html {
            return Ok(None);
        }

        let filename = url.rsplit('/').next().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.kit_directory).await?;
        let filepath = self.kit_directory.join(format!("{sample_id}-{filename}"));

        let mut hasher = Sha256::new();
        let mut filesize: u64 = 0;
        let mut file = tokio::fs::File::create(&filepath).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            filesize += chunk.len() as u64;
        }
        file.flush().await?;

        let kit = PhishKit {
            hash: hex::encode(hasher.finalize()),
            url: url.to_string(),
            filename,
            filepath: filepath.to_string_lossy().into_owned(),
            filesize,
        };
        self.store.upsert(&kit).await?;
        log::info!("Found kit at {}", url);

        Ok(Some(kit))
    }
}
