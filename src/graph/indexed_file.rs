//! Indexed file manifest entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Manifest entry tracking a single indexed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFile {
    pub path: String,
    pub language: String,
    pub neuron_count: i64,
    pub last_indexed: DateTime<Utc>,
    /// Content hash used to detect unchanged files on incremental reindex.
    pub content_hash: String,
}
