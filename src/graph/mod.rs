//! Graph data model - neurons, synapses, and the manifests that track them
//!
//! The graph may contain cycles (mutual imports, reciprocal co-activation).
//! It is represented as two independent tables (neurons, synapses) keyed by
//! opaque ids — neighbor lists are never embedded inside neuron records, so
//! cycles are just ordinary edges. The Graph Walker's visited-with-best-score
//! bookkeeping is what makes traversal over such a graph safe.

mod indexed_file;
mod neuron;
mod query_log;
mod synapse;

pub use indexed_file::IndexedFile;
pub use neuron::{Neuron, NeuronCreateInput, NeuronType};
pub use query_log::QueryLogEntry;
pub use synapse::{Synapse, SynapseCreateInput, SynapseType};
