//! Synapse - a weighted directed edge between two neurons

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SYNAPSE TYPE
// ============================================================================

/// The closed set of relation kinds a synapse can carry.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SynapseType {
    Imports,
    Calls,
    TypeReference,
    Extends,
    Proximity,
    CoActivation,
    Semantic,
}

impl SynapseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynapseType::Imports => "imports",
            SynapseType::Calls => "calls",
            SynapseType::TypeReference => "type_reference",
            SynapseType::Extends => "extends",
            SynapseType::Proximity => "proximity",
            SynapseType::CoActivation => "co_activation",
            SynapseType::Semantic => "semantic",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "imports" => Some(SynapseType::Imports),
            "calls" => Some(SynapseType::Calls),
            "type_reference" => Some(SynapseType::TypeReference),
            "extends" => Some(SynapseType::Extends),
            "proximity" => Some(SynapseType::Proximity),
            "co_activation" => Some(SynapseType::CoActivation),
            "semantic" => Some(SynapseType::Semantic),
            _ => None,
        }
    }

    /// Structural synapses are created by the indexer and are never touched
    /// by the Learner's decay/prune jobs — only `co_activation` edges are.
    pub fn is_structural(&self) -> bool {
        !matches!(self, SynapseType::CoActivation)
    }
}

impl std::fmt::Display for SynapseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SYNAPSE
// ============================================================================

/// A weighted directed edge between two distinct neurons.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synapse {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    /// Clamped to `[0.0, 1.0]` under all updates.
    pub weight: f32,
    pub synapse_type: String,
    /// Open-ended structured metadata (e.g. import path), serialized as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub fire_count: i64,
    pub last_fired: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Synapse {
    pub fn get_synapse_type(&self) -> Option<SynapseType> {
        SynapseType::parse_name(&self.synapse_type)
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a new synapse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SynapseCreateInput {
    pub source_id: String,
    pub target_id: String,
    pub synapse_type: String,
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl SynapseCreateInput {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, synapse_type: SynapseType, weight: f32) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            synapse_type: synapse_type.as_str().to_string(),
            weight,
            metadata: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
