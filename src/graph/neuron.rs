//! Neuron - the fundamental unit of the code graph
//!
//! Each neuron represents a discrete semantic chunk of source code: its raw
//! text, a one-line summary, an optional embedding, and the file location it
//! was extracted from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// NEURON TYPE
// ============================================================================

/// The closed set of chunk classifications a neuron can carry.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NeuronType {
    #[default]
    Function,
    Class,
    Method,
    Type,
    Interface,
    Module,
    Config,
    Doc,
    Variable,
    Export,
}

impl NeuronType {
    /// Convert to the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            NeuronType::Function => "function",
            NeuronType::Class => "class",
            NeuronType::Method => "method",
            NeuronType::Type => "type",
            NeuronType::Interface => "interface",
            NeuronType::Module => "module",
            NeuronType::Config => "config",
            NeuronType::Doc => "doc",
            NeuronType::Variable => "variable",
            NeuronType::Export => "export",
        }
    }

    /// Parse from a stored string, defaulting to `Function` on unknown input.
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "function" => NeuronType::Function,
            "class" => NeuronType::Class,
            "method" => NeuronType::Method,
            "type" => NeuronType::Type,
            "interface" => NeuronType::Interface,
            "module" => NeuronType::Module,
            "config" => NeuronType::Config,
            "doc" => NeuronType::Doc,
            "variable" => NeuronType::Variable,
            "export" => NeuronType::Export,
            _ => NeuronType::Function,
        }
    }
}

impl std::fmt::Display for NeuronType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// NEURON
// ============================================================================

/// A stored semantic code chunk.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neuron {
    /// Opaque unique identifier, stable across sessions.
    pub id: String,
    /// Raw source text of the chunk.
    pub content: String,
    /// One-line human-readable summary.
    pub summary: String,
    /// Dense embedding vector. Empty when the neuron has not been embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Path to the source file, relative to the project root.
    pub file_path: String,
    /// Inclusive start line (1-indexed).
    pub start_line: i64,
    /// Inclusive end line (1-indexed).
    pub end_line: i64,
    /// Chunk classification.
    pub neuron_type: String,
    /// Free-form identifier name (function name, class name, etc.).
    pub name: String,
    /// Source language (e.g. "rust", "python").
    pub language: String,
    /// Monotonically increasing count of query acceptances.
    pub activation_count: i64,
    /// When this neuron was last accepted by a query.
    pub last_activated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Neuron {
    /// Parsed neuron type classification.
    pub fn get_neuron_type(&self) -> NeuronType {
        NeuronType::parse_name(&self.neuron_type)
    }

    /// Whether this neuron carries a (nonempty) embedding.
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|v| !v.is_empty())
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a new neuron.
///
/// Uses `deny_unknown_fields` to prevent field injection from untrusted
/// indexer input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NeuronCreateInput {
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub file_path: String,
    pub start_line: i64,
    pub end_line: i64,
    #[serde(default)]
    pub neuron_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
}

impl Default for NeuronCreateInput {
    fn default() -> Self {
        Self {
            content: String::new(),
            summary: String::new(),
            embedding: Vec::new(),
            file_path: String::new(),
            start_line: 1,
            end_line: 1,
            neuron_type: "function".to_string(),
            name: String::new(),
            language: String::new(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
