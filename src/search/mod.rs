//! Vector similarity search
//!
//! Embedding byte encoding plus a flat cosine-similarity scan over cached
//! neuron vectors.

mod embedding;
mod vector;

pub use embedding::{cosine_similarity, from_bytes, to_bytes};
pub use vector::{VectorIndex, VectorIndexStats, VectorSearchError, DEFAULT_DIMENSIONS};
