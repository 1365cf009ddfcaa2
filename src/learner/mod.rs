//! Hebbian edge learning
//!
//! Post-query and periodic mutations to `co_activation` synapses: creation
//! on first co-activation, strengthening on repeated co-activation or
//! reported use, age-based decay, and pruning below a floor. Structural
//! synapse types (imports, calls, ...) are never touched here — they are
//! only removed via file-reindex cascades at the Store layer.

use tracing::warn;

use crate::graph::{SynapseCreateInput, SynapseType};
use crate::storage::{Store, StoreError};
use crate::Deadline;

/// Initial weight assigned to a newly synthesized co-activation synapse.
pub const DEFAULT_INITIAL_WEIGHT: f32 = 0.3;

/// Weight delta applied per co-activation or reported use.
pub const DEFAULT_STRENGTHEN_DELTA: f32 = 0.05;

/// Number of synapses processed per transaction in the decay/prune jobs,
/// bounding how long the store is held between deadline checks.
const BATCH_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub initial_weight: f32,
    pub strengthen_delta: f32,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            initial_weight: DEFAULT_INITIAL_WEIGHT,
            strengthen_delta: DEFAULT_STRENGTHEN_DELTA,
        }
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LearnerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Stateless edge-mutation operations against a Store.
pub struct Learner {
    config: LearnerConfig,
}

impl Learner {
    pub fn new(config: LearnerConfig) -> Self {
        Self { config }
    }

    /// Strengthen the `co_activation` edge `a -> b` by `strengthen_delta`
    /// if it exists, otherwise create it at `initial_weight`. Call this
    /// for both `(a, b)` and `(b, a)` to apply the Retrieval Engine's
    /// symmetric co-activation semantics.
    pub fn observe_co_activation(&self, store: &Store, a: &str, b: &str) -> Result<(), LearnerError> {
        if a == b {
            return Ok(());
        }
        match store.adjust_weight(a, b, Some(SynapseType::CoActivation), self.config.strengthen_delta) {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                match store.create_synapse(SynapseCreateInput::new(
                    a,
                    b,
                    SynapseType::CoActivation,
                    self.config.initial_weight,
                )) {
                    Ok(_) | Err(StoreError::Conflict(_)) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Strengthen the `co_activation` edge `a -> b` if it already exists;
    /// never creates a new edge. Used by `report_used`.
    pub fn reinforce_use(&self, store: &Store, a: &str, b: &str) -> Result<(), LearnerError> {
        if a == b {
            return Ok(());
        }
        match store.adjust_weight(a, b, Some(SynapseType::CoActivation), self.config.strengthen_delta) {
            Ok(_) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `observe_co_activation` over every ordered pair in `ids`,
    /// logging (not propagating) individual failures: a Learner hiccup
    /// must never fail the retrieval path that called it.
    pub fn observe_co_activation_set(&self, store: &Store, ids: &[String]) {
        for a in ids {
            for b in ids {
                if a == b {
                    continue;
                }
                if let Err(e) = self.observe_co_activation(store, a, b) {
                    warn!(a = %a, b = %b, error = %e, "co-activation update failed");
                }
            }
        }
    }

    /// Run `reinforce_use` over every ordered pair in `ids`, best-effort.
    pub fn reinforce_use_set(&self, store: &Store, ids: &[String]) {
        for a in ids {
            for b in ids {
                if a == b {
                    continue;
                }
                if let Err(e) = self.reinforce_use(store, a, b) {
                    warn!(a = %a, b = %b, error = %e, "reinforce_use failed");
                }
            }
        }
    }

    /// Decrement the weight of every `co_activation` synapse whose
    /// `last_fired` (or `created_at`, if never fired) is older than
    /// `days_old` days, by `delta`, clamped at 0. Interruptible between
    /// batches of bounded size. Returns the count mutated, or
    /// `LearnerError::Store(StoreError::Cancelled)` if `deadline` expires
    /// before the stale-edge scan itself completes.
    pub fn decay(
        &self,
        store: &Store,
        days_old: i64,
        delta: f32,
        deadline: Option<&Deadline>,
    ) -> Result<u64, LearnerError> {
        let stale = store.stale_co_activation_synapses(days_old, deadline)?;
        let mut mutated = 0u64;

        for chunk in stale.chunks(BATCH_SIZE) {
            if let Some(deadline) = deadline {
                if deadline.is_expired() {
                    break;
                }
            }
            for synapse in chunk {
                store.decrement_weight(&synapse.id, delta)?;
                mutated += 1;
            }
        }

        Ok(mutated)
    }

    /// Delete `co_activation` synapses whose weight is `<= floor`. Returns
    /// the count removed.
    pub fn prune(&self, store: &Store, floor: f32) -> Result<u64, LearnerError> {
        Ok(store.prune_co_activation_below(floor)?)
    }
}
