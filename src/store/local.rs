// src/store/local.rs

//! Local JSON-file-backed store.
//!
//! Implements both persistence traits over two flat JSON files:
//!
//! ```text
//! {root}/
//! ├── samples.json          # Sample records keyed by id
//! └── kits.json             # PhishKit records keyed by content hash
//! ```
//!
//! Records live in memory behind async locks and are written through to
//! disk on every upsert (write to temp, then rename). Holding the write
//! lock across the persist serializes writers, which yields the
//! last-write-wins semantics the index contract asks for.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{PhishKit, Sample};
use crate::store::{KitStore, SampleIndex};

const SAMPLES_FILE: &str = "samples.json";
const KITS_FILE: &str = "kits.json";

/// Local filesystem store backend.
pub struct LocalStore {
    root: PathBuf,
    samples: RwLock<HashMap<String, Sample>>,
    kits: RwLock<HashMap<String, PhishKit>>,
}

impl LocalStore {
    /// Open a store rooted at the given directory, loading any records
    /// persisted by earlier runs.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        let samples: Vec<Sample> = Self::read_json(&root.join(SAMPLES_FILE))
            .await?
            .unwrap_or_default();
        let kits: Vec<PhishKit> = Self::read_json(&root.join(KITS_FILE))
            .await?
            .unwrap_or_default();

        Ok(Self {
            root,
            samples: RwLock::new(samples.into_iter().map(|s| (s.id.clone(), s)).collect()),
            kits: RwLock::new(kits.into_iter().map(|k| (k.hash.clone(), k)).collect()),
        })
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write JSON atomically (write to temp, then rename).
    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.root.join(file);
        let bytes = serde_json::to_vec_pretty(value)?;

        let tmp = path.with_extension("tmp");
        let mut out = tokio::fs::File::create(&tmp).await?;
        out.write_all(&bytes).await?;
        out.flush().await?;
        drop(out);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn persist_samples(&self, records: &HashMap<String, Sample>) -> Result<()> {
        let mut rows: Vec<&Sample> = records.values().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        self.write_json(SAMPLES_FILE, &rows).await
    }

    async fn persist_kits(&self, records: &HashMap<String, PhishKit>) -> Result<()> {
        let mut rows: Vec<&PhishKit> = records.values().collect();
        rows.sort_by(|a, b| a.hash.cmp(&b.hash));
        self.write_json(KITS_FILE, &rows).await
    }
}

#[async_trait]
impl SampleIndex for LocalStore {
    async fn exists(&self, normalized_url: &str) -> Result<bool> {
        let samples = self.samples.read().await;
        Ok(samples.values().any(|s| s.normalized_url == normalized_url))
    }

    async fn most_recent(&self, feed: &str) -> Result<Option<Sample>> {
        let samples = self.samples.read().await;
        Ok(samples
            .values()
            .filter(|s| s.feed == feed)
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    async fn upsert(&self, sample: &Sample) -> Result<()> {
        let mut samples = self.samples.write().await;
        samples.insert(sample.id.clone(), sample.clone());
        self.persist_samples(&samples).await
    }
}

#[async_trait]
impl KitStore for LocalStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<PhishKit>> {
        let kits = self.kits.read().await;
        Ok(kits.values().find(|k| k.url == url).cloned())
    }

    async fn upsert(&self, kit: &PhishKit) -> Result<()> {
        let mut kits = self.kits.write().await;
        kits.insert(kit.hash.clone(), kit.clone());
        self.persist_kits(&kits).await
    }
}
