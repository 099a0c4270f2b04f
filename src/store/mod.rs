// src/store/mod.rs

//! Persistence boundaries for samples and kits.
//!
//! The collection pipeline only ever talks to these two traits. Both
//! must tolerate concurrent readers and writers: the sample index is
//! last-write-wins per sample id, and the kit store is first-write-wins
//! per content hash through the pre-download existence check — two
//! workers racing past that check may both download the same kit, which
//! wastes bandwidth but must not corrupt state.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PhishKit, Sample};

// Re-export for convenience
pub use local::LocalStore;

/// Searchable index of processed samples.
#[async_trait]
pub trait SampleIndex: Send + Sync {
    /// Whether a sample with this normalized URL has already been seen.
    async fn exists(&self, normalized_url: &str) -> Result<bool>;

    /// The most recently collected sample for a feed, if any.
    async fn most_recent(&self, feed: &str) -> Result<Option<Sample>>;

    /// Insert or replace the record for a sample id.
    async fn upsert(&self, sample: &Sample) -> Result<()>;
}

/// Content-addressed record of recovered kits.
#[async_trait]
pub trait KitStore: Send + Sync {
    /// Look up a kit by the exact URL it was fetched from.
    async fn find_by_url(&self, url: &str) -> Result<Option<PhishKit>>;

    /// Insert or replace the record for a kit hash.
    async fn upsert(&self, kit: &PhishKit) -> Result<()>;
}
