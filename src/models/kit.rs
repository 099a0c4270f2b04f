// src/models/kit.rs

//! Phishing kit metadata.

use serde::{Deserialize, Serialize};

/// One recovered kit archive, identified by content hash rather than
/// URL so the same kit found on multiple sites is stored once.
///
/// Created once per unique content hash on first successful download;
/// never mutated or deleted afterwards. Samples reference kits through
/// their hash; a kit carries no back-pointer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhishKit {
    /// Hex content digest, primary identity
    pub hash: String,

    /// URL the archive was fetched from
    pub url: String,

    /// Archive filename as it appeared on the hosting server
    pub filename: String,

    /// Local storage path of the downloaded archive
    pub filepath: String,

    /// Downloaded size in bytes
    pub filesize: u64,
}
