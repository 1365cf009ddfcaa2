//! Query log entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single logged query and the neurons it activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    pub id: String,
    pub query: String,
    pub activated_neuron_ids: Vec<String>,
    pub used_neuron_ids: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}
