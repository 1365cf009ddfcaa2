//! Shared test harness
//!
//! Isolated store instances for integration tests, one temp directory per
//! test so runs never interfere with each other.

use neuralrag_core::Store;
use std::path::PathBuf;
use tempfile::TempDir;

/// A store backed by a temporary directory, deleted when dropped.
pub struct TestStore {
    pub store: Store,
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestStore {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = temp_dir.path().join("brain.db");
        let store = Store::open_at(db_path.clone()).expect("failed to open test store");

        Self {
            store,
            _temp_dir: temp_dir,
            db_path,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}
