// src/models/sample.rs

//! Sample data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::url::normalize;

/// One reported phishing page.
///
/// A sample is created by a feed source or the submission endpoint,
/// mutated only by the orchestrator during its single processing pass,
/// and immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    /// Provider-assigned or generated identifier, unique within the index
    pub id: String,

    /// Original reported URL, possibly with an obfuscated scheme
    pub url: String,

    /// Normalized `scheme://host/path` form used as the dedup key
    pub normalized_url: String,

    /// Name of the originating feed
    pub feed: String,

    /// HTTP status of the page fetch, 0 if unreachable
    pub status_code: u16,

    /// Raw page body, empty if unreachable
    pub html: String,

    /// Resolved hosting IP, absent when resolution failed
    pub ip_address: Option<String>,

    /// Whether the crawl found any open directory listing
    pub indexing_enabled: bool,

    /// Whether any kit archive was recovered
    pub has_kit: bool,

    /// Content hashes of the kits recovered for this sample, in
    /// discovery order
    pub kit_hashes: Vec<String>,

    /// Collection time
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    /// Create a new unprocessed sample.
    ///
    /// The normalized URL is derived from the reported URL as given;
    /// scheme deobfuscation happens later, during collection.
    pub fn new(id: impl Into<String>, url: impl Into<String>, feed: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            normalized_url: normalize(&url),
            url,
            feed: feed.into(),
            status_code: 0,
            html: String::new(),
            ip_address: None,
            indexing_enabled: false,
            has_kit: false,
            kit_hashes: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Reset the sample to the degraded terminal shape: unreachable
    /// status, empty body, no kits.
    pub fn degrade(&mut self) {
        self.status_code = 0;
        self.html.clear();
        self.indexing_enabled = false;
        self.has_kit = false;
        self.kit_hashes.clear();
    }
}
