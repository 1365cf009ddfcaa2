//! Embedding vector utilities
//!
//! The embedding model itself is an external collaborator: this module only
//! deals with the vector once produced — similarity, distance, and the
//! on-disk byte encoding.

/// Cosine similarity between two vectors. Returns `0.0` for mismatched or
/// zero-norm inputs rather than panicking, since a neuron may carry an
/// embedding from a prior model generation.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Encode a vector as a little-endian `f32` byte blob. Empty vectors encode
/// to `None`, matching "no embedding" in the store.
pub fn to_bytes(vector: &[f32]) -> Option<Vec<u8>> {
    if vector.is_empty() {
        return None;
    }
    Some(vector.iter().flat_map(|f| f.to_le_bytes()).collect())
}

/// Decode a little-endian `f32` byte blob. Returns an empty vector for
/// malformed input (length not divisible by 4) rather than erroring, since
/// the caller treats an empty embedding as "unembedded".
pub fn from_bytes(bytes: &[u8]) -> Vec<f32> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Vec::new();
    }
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
