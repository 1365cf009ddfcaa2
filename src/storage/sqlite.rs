//! SQLite-backed store implementation
//!
//! Durable embedded relational store for neurons, synapses, the indexed-file
//! manifest, and the query log. Uses separate reader/writer connections for
//! interior mutability: all methods take `&self`, making `Store` `Send +
//! Sync` so callers can share it behind an `Arc` without an outer mutex.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use super::migrations::{apply_migrations, get_current_version, CURRENT_SCHEMA_VERSION};
use crate::graph::{
    IndexedFile, Neuron, NeuronCreateInput, QueryLogEntry, Synapse, SynapseCreateInput,
    SynapseType,
};
use crate::search::{from_bytes as embedding_from_bytes, to_bytes as embedding_to_bytes};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Store error type.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unknown id.
    #[error("not found: {0}")]
    NotFound(String),
    /// Out-of-range line span, bad weight, empty entries, wrong embedding dimension.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Duplicate synapse on the unique key, for single-insert callers who care.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Corruption or an underlying database error.
    #[error("store failure: {0}")]
    StoreFailure(#[from] rusqlite::Error),
    /// Failed to create the parent directory for the database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Deadline exceeded before the operation completed.
    #[error("operation cancelled")]
    Cancelled,
    /// The store's schema version is newer than this build understands.
    #[error("unsupported schema version {0}, expected <= {1}")]
    UnsupportedSchema(u32, u32),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// STATS
// ============================================================================

/// Aggregate counts over the store, used by callers to report dashboard
/// summaries. `avg_activation_depth` is intentionally absent here: it is
/// computed by the Retrieval Engine from a single query's results, not by
/// the Store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub neuron_count: i64,
    pub synapse_count: i64,
    pub indexed_file_count: i64,
    pub distinct_languages: i64,
    pub most_recent_index: Option<DateTime<Utc>>,
    pub total_queries: i64,
}

// ============================================================================
// STORE
// ============================================================================

/// Embedded relational store for the code graph.
pub struct Store {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Store {
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (creating if absent) the store at `db_path`, applying pending
    /// migrations. Pass `None` for an in-memory store, used by tests.
    pub fn new(db_path: Option<&Path>) -> Result<Self> {
        // In-memory stores use a named shared-cache URI so the reader
        // connection observes the writer's data; a plain `:memory:` path
        // would give each connection an independent, isolated database.
        let memory_uri = format!("file:neuralrag-{}?mode=memory&cache=shared", Uuid::new_v4());

        let writer_conn = match db_path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(p)?
            }
            None => Connection::open(&memory_uri)?,
        };
        Self::configure_connection(&writer_conn)?;
        apply_migrations(&writer_conn)?;

        let version = get_current_version(&writer_conn)?;
        if version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema(version, CURRENT_SCHEMA_VERSION));
        }

        let reader_conn = match db_path {
            Some(p) => Connection::open(p)?,
            None => Connection::open(&memory_uri)?,
        };
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    /// Open a store backed by a file path, most commonly a path inside a
    /// `tempfile::TempDir` for test isolation. Unlike `new(None)`, this
    /// gives writer and reader genuinely independent connections onto the
    /// same file, matching production topology.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        Self::new(Some(&path))
    }

    fn writer(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reader(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.reader.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Neurons
    // ------------------------------------------------------------------

    fn validate_neuron_input(input: &NeuronCreateInput) -> Result<()> {
        if input.start_line > input.end_line {
            return Err(StoreError::InvalidArgument(format!(
                "start_line {} > end_line {}",
                input.start_line, input.end_line
            )));
        }
        Ok(())
    }

    /// The store-wide embedding dimension, fixed by whichever neuron first
    /// carried a nonempty embedding. `None` if no neuron has one yet.
    fn embedding_dimension(conn: &Connection) -> Result<Option<usize>> {
        conn.query_row(
            "SELECT value FROM _meta WHERE key = 'embedding_dimension'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                StoreError::StoreFailure(rusqlite::Error::InvalidColumnType(
                    0,
                    "embedding_dimension".to_string(),
                    rusqlite::types::Type::Text,
                ))
            })
        })
        .transpose()
    }

    /// Reject an embedding whose dimension disagrees with the store-wide
    /// dimension; fix the store-wide dimension the first time a nonempty
    /// embedding is seen. A no-op for empty (unembedded) inputs.
    fn check_embedding_dimension(conn: &Connection, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            return Ok(());
        }
        match Self::embedding_dimension(conn)? {
            Some(dim) if dim != embedding.len() => Err(StoreError::InvalidArgument(format!(
                "embedding dimension {} does not match store-wide dimension {}",
                embedding.len(),
                dim
            ))),
            Some(_) => Ok(()),
            None => {
                conn.execute(
                    "INSERT INTO _meta (key, value) VALUES ('embedding_dimension', ?1)
                     ON CONFLICT(key) DO NOTHING",
                    params![embedding.len().to_string()],
                )?;
                Ok(())
            }
        }
    }

    pub fn create_neuron(&self, input: NeuronCreateInput) -> Result<Neuron> {
        Self::validate_neuron_input(&input)?;
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let neuron_type = if input.neuron_type.is_empty() {
            "function".to_string()
        } else {
            input.neuron_type.clone()
        };
        let embedding_bytes = embedding_to_bytes(&input.embedding);

        let writer = self.writer();
        Self::check_embedding_dimension(&writer, &input.embedding)?;
        writer.execute(
            "INSERT INTO neurons (id, content, summary, embedding, file_path, start_line,
                end_line, type, name, language, activation_count, last_activated, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, NULL, ?11, ?11)",
            params![
                id,
                input.content,
                input.summary,
                embedding_bytes,
                input.file_path,
                input.start_line,
                input.end_line,
                neuron_type,
                input.name,
                input.language,
                to_iso(now),
            ],
        )?;

        Ok(Neuron {
            id,
            content: input.content,
            summary: input.summary,
            embedding: if input.embedding.is_empty() {
                None
            } else {
                Some(input.embedding)
            },
            file_path: input.file_path,
            start_line: input.start_line,
            end_line: input.end_line,
            neuron_type,
            name: input.name,
            language: input.language,
            activation_count: 0,
            last_activated: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Atomically insert every neuron, or none. Returns the created neurons
    /// in input order.
    pub fn create_neurons_batch(&self, inputs: Vec<NeuronCreateInput>) -> Result<Vec<Neuron>> {
        if inputs.is_empty() {
            return Err(StoreError::InvalidArgument("empty batch".to_string()));
        }
        for input in &inputs {
            Self::validate_neuron_input(input)?;
        }

        let mut writer = self.writer();
        let tx = writer.transaction()?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let now = Utc::now();
            let id = Uuid::new_v4().to_string();
            let neuron_type = if input.neuron_type.is_empty() {
                "function".to_string()
            } else {
                input.neuron_type.clone()
            };
            let embedding_bytes = embedding_to_bytes(&input.embedding);
            Self::check_embedding_dimension(&tx, &input.embedding)?;

            tx.execute(
                "INSERT INTO neurons (id, content, summary, embedding, file_path, start_line,
                    end_line, type, name, language, activation_count, last_activated, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, NULL, ?11, ?11)",
                params![
                    id,
                    input.content,
                    input.summary,
                    embedding_bytes,
                    input.file_path,
                    input.start_line,
                    input.end_line,
                    neuron_type,
                    input.name,
                    input.language,
                    to_iso(now),
                ],
            )?;

            created.push(Neuron {
                id,
                content: input.content,
                summary: input.summary,
                embedding: if input.embedding.is_empty() {
                    None
                } else {
                    Some(input.embedding)
                },
                file_path: input.file_path,
                start_line: input.start_line,
                end_line: input.end_line,
                neuron_type,
                name: input.name,
                language: input.language,
                activation_count: 0,
                last_activated: None,
                created_at: now,
                updated_at: now,
            });
        }
        tx.commit()?;
        Ok(created)
    }

    pub fn get_neuron(&self, id: &str) -> Result<Neuron> {
        let reader = self.reader();
        reader
            .query_row(
                "SELECT id, content, summary, embedding, file_path, start_line, end_line,
                    type, name, language, activation_count, last_activated, created_at, updated_at
                 FROM neurons WHERE id = ?1",
                params![id],
                row_to_neuron,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Neurons belonging to `path`, ordered by `start_line` ascending.
    pub fn get_neurons_by_file(&self, path: &str) -> Result<Vec<Neuron>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, content, summary, embedding, file_path, start_line, end_line,
                type, name, language, activation_count, last_activated, created_at, updated_at
             FROM neurons WHERE file_path = ?1 ORDER BY start_line ASC",
        )?;
        let rows = stmt
            .query_map(params![path], row_to_neuron)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All neurons, ordered by `file_path` then `start_line`.
    pub fn get_all_neurons(&self) -> Result<Vec<Neuron>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, content, summary, embedding, file_path, start_line, end_line,
                type, name, language, activation_count, last_activated, created_at, updated_at
             FROM neurons ORDER BY file_path ASC, start_line ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_neuron)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete every neuron belonging to `path`. Cascades to their synapses.
    /// Returns the number of neurons deleted.
    pub fn delete_neurons_by_file(&self, path: &str) -> Result<u64> {
        let writer = self.writer();
        let count = writer.execute("DELETE FROM neurons WHERE file_path = ?1", params![path])?;
        Ok(count as u64)
    }

    pub fn increment_activation(&self, id: &str) -> Result<()> {
        let now = to_iso(Utc::now());
        let writer = self.writer();
        let changed = writer.execute(
            "UPDATE neurons SET activation_count = activation_count + 1,
                last_activated = ?2, updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Synapses
    // ------------------------------------------------------------------

    fn validate_synapse_input(input: &SynapseCreateInput) -> Result<()> {
        if input.source_id == input.target_id {
            return Err(StoreError::InvalidArgument(
                "source_id and target_id must differ".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&input.weight) {
            return Err(StoreError::InvalidArgument(format!(
                "weight {} out of range [0, 1]",
                input.weight
            )));
        }
        if SynapseType::parse_name(&input.synapse_type).is_none() {
            return Err(StoreError::InvalidArgument(format!(
                "unknown synapse type {}",
                input.synapse_type
            )));
        }
        Ok(())
    }

    /// Insert-if-absent on `(source_id, target_id, type)`. A duplicate call
    /// is a `Conflict`, not an upsert: the existing row's weight is left
    /// untouched.
    pub fn create_synapse(&self, input: SynapseCreateInput) -> Result<Synapse> {
        Self::validate_synapse_input(&input)?;
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let metadata_json = input
            .metadata
            .as_ref()
            .map(|v| serde_json::to_string(v).unwrap_or_default());

        let writer = self.writer();
        let inserted = writer.execute(
            "INSERT OR IGNORE INTO synapses (id, source_id, target_id, weight, type, metadata,
                fire_count, last_fired, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7)",
            params![
                id,
                input.source_id,
                input.target_id,
                input.weight,
                input.synapse_type,
                metadata_json,
                to_iso(now),
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Conflict(format!(
                "synapse ({}, {}, {}) already exists",
                input.source_id, input.target_id, input.synapse_type
            )));
        }

        Ok(Synapse {
            id,
            source_id: input.source_id,
            target_id: input.target_id,
            weight: input.weight,
            synapse_type: input.synapse_type,
            metadata: input.metadata,
            fire_count: 0,
            last_fired: None,
            created_at: now,
        })
    }

    /// Insert-if-absent for every input, atomically. Duplicates are
    /// silently skipped; only newly created synapses are returned.
    pub fn create_synapses_batch(&self, inputs: Vec<SynapseCreateInput>) -> Result<Vec<Synapse>> {
        if inputs.is_empty() {
            return Err(StoreError::InvalidArgument("empty batch".to_string()));
        }
        for input in &inputs {
            Self::validate_synapse_input(input)?;
        }

        let mut writer = self.writer();
        let tx = writer.transaction()?;
        let mut created = Vec::new();
        for input in inputs {
            let now = Utc::now();
            let id = Uuid::new_v4().to_string();
            let metadata_json = input
                .metadata
                .as_ref()
                .map(|v| serde_json::to_string(v).unwrap_or_default());

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO synapses (id, source_id, target_id, weight, type, metadata,
                    fire_count, last_fired, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7)",
                params![
                    id,
                    input.source_id,
                    input.target_id,
                    input.weight,
                    input.synapse_type,
                    metadata_json,
                    to_iso(now),
                ],
            )?;

            if inserted > 0 {
                created.push(Synapse {
                    id,
                    source_id: input.source_id,
                    target_id: input.target_id,
                    weight: input.weight,
                    synapse_type: input.synapse_type,
                    metadata: input.metadata,
                    fire_count: 0,
                    last_fired: None,
                    created_at: now,
                });
            }
        }
        tx.commit()?;
        Ok(created)
    }

    /// Synapses leaving `neuron_id`, ordered by weight descending.
    pub fn get_outgoing(&self, neuron_id: &str) -> Result<Vec<Synapse>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, source_id, target_id, weight, type, metadata, fire_count, last_fired, created_at
             FROM synapses WHERE source_id = ?1 ORDER BY weight DESC",
        )?;
        let rows = stmt
            .query_map(params![neuron_id], row_to_synapse)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Synapses arriving at `neuron_id`, ordered by weight descending.
    pub fn get_incoming(&self, neuron_id: &str) -> Result<Vec<Synapse>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, source_id, target_id, weight, type, metadata, fire_count, last_fired, created_at
             FROM synapses WHERE target_id = ?1 ORDER BY weight DESC",
        )?;
        let rows = stmt
            .query_map(params![neuron_id], row_to_synapse)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All synapses touching `neuron_id` in either direction, ordered by
    /// weight descending.
    pub fn get_connected(&self, neuron_id: &str) -> Result<Vec<Synapse>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT id, source_id, target_id, weight, type, metadata, fire_count, last_fired, created_at
             FROM synapses WHERE source_id = ?1 OR target_id = ?1 ORDER BY weight DESC",
        )?;
        let rows = stmt
            .query_map(params![neuron_id], row_to_synapse)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Adjust the weight of every synapse keyed by `(source, target)`, and
    /// optionally `type`, by `delta`, clamped to `[0, 1]`. On a positive
    /// delta also bumps `fire_count` and sets `last_fired`. `None` for
    /// `synapse_type` matches every type on that `(source, target)` pair,
    /// not just one. Returns every row touched; `NotFound` if none matched.
    pub fn adjust_weight(
        &self,
        source_id: &str,
        target_id: &str,
        synapse_type: Option<SynapseType>,
        delta: f32,
    ) -> Result<Vec<Synapse>> {
        let writer = self.writer();
        let type_filter = synapse_type.map(|t| t.as_str().to_string());

        let matching: Vec<(String, f32)> = {
            let mut stmt = writer.prepare(
                "SELECT id, weight FROM synapses
                 WHERE source_id = ?1 AND target_id = ?2 AND (?3 IS NULL OR type = ?3)",
            )?;
            stmt.query_map(params![source_id, target_id, type_filter], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
        };

        if matching.is_empty() {
            return Err(StoreError::NotFound(format!(
                "synapse ({}, {}, {})",
                source_id,
                target_id,
                synapse_type.map(|t| t.to_string()).unwrap_or_else(|| "*".to_string())
            )));
        }

        let now = to_iso(Utc::now());
        let mut updated = Vec::with_capacity(matching.len());
        for (id, weight) in matching {
            let new_weight = (weight + delta).clamp(0.0, 1.0);
            if delta > 0.0 {
                writer.execute(
                    "UPDATE synapses SET weight = ?2, fire_count = fire_count + 1, last_fired = ?3 WHERE id = ?1",
                    params![id, new_weight, now],
                )?;
            } else {
                writer.execute(
                    "UPDATE synapses SET weight = ?2 WHERE id = ?1",
                    params![id, new_weight],
                )?;
            }

            let synapse = writer.query_row(
                "SELECT id, source_id, target_id, weight, type, metadata, fire_count, last_fired, created_at
                 FROM synapses WHERE id = ?1",
                params![id],
                row_to_synapse,
            )?;
            updated.push(synapse);
        }

        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Indexed files
    // ------------------------------------------------------------------

    pub fn upsert_indexed_file(&self, file: IndexedFile) -> Result<()> {
        let writer = self.writer();
        writer.execute(
            "INSERT INTO indexed_files (path, language, neuron_count, last_indexed, content_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET
                language = excluded.language,
                neuron_count = excluded.neuron_count,
                last_indexed = excluded.last_indexed,
                content_hash = excluded.content_hash",
            params![
                file.path,
                file.language,
                file.neuron_count,
                to_iso(file.last_indexed),
                file.content_hash,
            ],
        )?;
        Ok(())
    }

    pub fn get_indexed_file(&self, path: &str) -> Result<Option<IndexedFile>> {
        let reader = self.reader();
        reader
            .query_row(
                "SELECT path, language, neuron_count, last_indexed, content_hash
                 FROM indexed_files WHERE path = ?1",
                params![path],
                row_to_indexed_file,
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn delete_indexed_file(&self, path: &str) -> Result<()> {
        let writer = self.writer();
        writer.execute("DELETE FROM indexed_files WHERE path = ?1", params![path])?;
        Ok(())
    }

    pub fn list_indexed_files(&self) -> Result<Vec<IndexedFile>> {
        let reader = self.reader();
        let mut stmt = reader.prepare(
            "SELECT path, language, neuron_count, last_indexed, content_hash
             FROM indexed_files ORDER BY path ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_indexed_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Query log
    // ------------------------------------------------------------------

    pub fn log_query(
        &self,
        query: &str,
        activated_ids: &[String],
        used_ids: Option<&[String]>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let activated_json = serde_json::to_string(activated_ids).unwrap_or_else(|_| "[]".to_string());
        let used_json = used_ids.map(|ids| serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string()));

        let writer = self.writer();
        writer.execute(
            "INSERT INTO query_log (id, query, activated_neuron_ids, used_neuron_ids, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, query, activated_json, used_json, to_iso(now)],
        )?;
        Ok(id)
    }

    /// Record that `used_ids` were the subset of a prior query's activated
    /// set that the caller actually used.
    pub fn report_used(&self, query_id: &str, used_ids: &[String]) -> Result<()> {
        let used_json = serde_json::to_string(used_ids).unwrap_or_else(|_| "[]".to_string());
        let writer = self.writer();
        let changed = writer.execute(
            "UPDATE query_log SET used_neuron_ids = ?2 WHERE id = ?1",
            params![query_id, used_json],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(query_id.to_string()));
        }
        Ok(())
    }

    pub fn get_query_log_entry(&self, id: &str) -> Result<QueryLogEntry> {
        let reader = self.reader();
        reader
            .query_row(
                "SELECT id, query, activated_neuron_ids, used_neuron_ids, timestamp
                 FROM query_log WHERE id = ?1",
                params![id],
                row_to_query_log_entry,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Aggregate operations
    // ------------------------------------------------------------------

    pub fn stats(&self) -> Result<StoreStats> {
        let reader = self.reader();
        let neuron_count: i64 = reader.query_row("SELECT COUNT(*) FROM neurons", [], |r| r.get(0))?;
        let synapse_count: i64 = reader.query_row("SELECT COUNT(*) FROM synapses", [], |r| r.get(0))?;
        let indexed_file_count: i64 =
            reader.query_row("SELECT COUNT(*) FROM indexed_files", [], |r| r.get(0))?;
        let distinct_languages: i64 = reader.query_row(
            "SELECT COUNT(DISTINCT language) FROM neurons WHERE language != ''",
            [],
            |r| r.get(0),
        )?;
        let most_recent_index: Option<String> = reader
            .query_row("SELECT MAX(last_indexed) FROM indexed_files", [], |r| r.get(0))
            .optional()?
            .flatten();
        let total_queries: i64 = reader.query_row("SELECT COUNT(*) FROM query_log", [], |r| r.get(0))?;

        Ok(StoreStats {
            neuron_count,
            synapse_count,
            indexed_file_count,
            distinct_languages,
            most_recent_index: most_recent_index.and_then(|s| from_iso(&s).ok()),
            total_queries,
        })
    }

    /// Delete query log, synapses, neurons, then indexed files, in an order
    /// that respects foreign-key cascades. Also releases the store-wide
    /// embedding dimension lock, since no neuron survives to hold it.
    pub fn clear_all(&self) -> Result<()> {
        let mut writer = self.writer();
        let tx = writer.transaction()?;
        tx.execute("DELETE FROM query_log", [])?;
        tx.execute("DELETE FROM synapses", [])?;
        tx.execute("DELETE FROM neurons", [])?;
        tx.execute("DELETE FROM indexed_files", [])?;
        tx.execute("DELETE FROM _meta WHERE key = 'embedding_dimension'", [])?;
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Learner support
    // ------------------------------------------------------------------

    /// All `co_activation` synapses whose `last_fired` (or `created_at` if
    /// never fired) is older than `days_old` days. Paged internally in
    /// batches of `STALE_SCAN_BATCH_SIZE`, checking `deadline` between
    /// pages; a deadline that's already passed before the scan finishes
    /// aborts with `StoreError::Cancelled` rather than returning a partial,
    /// silently-truncated list.
    pub fn stale_co_activation_synapses(
        &self,
        days_old: i64,
        deadline: Option<&crate::Deadline>,
    ) -> Result<Vec<Synapse>> {
        const STALE_SCAN_BATCH_SIZE: i64 = 256;

        let reader = self.reader();
        let cutoff = to_iso(Utc::now() - chrono::Duration::days(days_old));
        let mut results = Vec::new();
        let mut offset: i64 = 0;

        loop {
            if let Some(d) = deadline {
                if d.is_expired() {
                    return Err(StoreError::Cancelled);
                }
            }

            let mut stmt = reader.prepare(
                "SELECT id, source_id, target_id, weight, type, metadata, fire_count, last_fired, created_at
                 FROM synapses
                 WHERE type = 'co_activation'
                   AND COALESCE(last_fired, created_at) < ?1
                 ORDER BY id
                 LIMIT ?2 OFFSET ?3",
            )?;
            let page: Vec<Synapse> = stmt
                .query_map(params![cutoff, STALE_SCAN_BATCH_SIZE, offset], row_to_synapse)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let page_len = page.len();
            results.extend(page);
            if (page_len as i64) < STALE_SCAN_BATCH_SIZE {
                break;
            }
            offset += STALE_SCAN_BATCH_SIZE;
        }

        Ok(results)
    }

    /// Decrement `weight` by `delta` (clamped at 0) for the given synapse id.
    pub fn decrement_weight(&self, synapse_id: &str, delta: f32) -> Result<()> {
        let writer = self.writer();
        writer.execute(
            "UPDATE synapses SET weight = MAX(0.0, weight - ?2) WHERE id = ?1",
            params![synapse_id, delta],
        )?;
        Ok(())
    }

    /// Delete `co_activation` synapses whose weight is `<= floor`. Returns
    /// the count removed.
    pub fn prune_co_activation_below(&self, floor: f32) -> Result<u64> {
        let writer = self.writer();
        let count = writer.execute(
            "DELETE FROM synapses WHERE type = 'co_activation' AND weight <= ?1",
            params![floor],
        )?;
        Ok(count as u64)
    }

    /// All neuron `(id, embedding)` pairs with a nonempty embedding, for
    /// the Vector Index to load.
    pub fn all_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let reader = self.reader();
        let mut stmt =
            reader.prepare("SELECT id, embedding FROM neurons WHERE embedding IS NOT NULL")?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let bytes: Vec<u8> = row.get(1)?;
                Ok((id, bytes))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, bytes)| {
                let vec = embedding_from_bytes(&bytes);
                if vec.is_empty() {
                    None
                } else {
                    Some((id, vec))
                }
            })
            .collect())
    }
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

fn row_to_neuron(row: &rusqlite::Row<'_>) -> rusqlite::Result<Neuron> {
    let embedding_bytes: Option<Vec<u8>> = row.get(3)?;
    let last_activated: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Neuron {
        id: row.get(0)?,
        content: row.get(1)?,
        summary: row.get(2)?,
        embedding: embedding_bytes.and_then(|b| {
            let v = embedding_from_bytes(&b);
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        }),
        file_path: row.get(4)?,
        start_line: row.get(5)?,
        end_line: row.get(6)?,
        neuron_type: row.get(7)?,
        name: row.get(8)?,
        language: row.get(9)?,
        activation_count: row.get(10)?,
        last_activated: last_activated.and_then(|s| from_iso(&s).ok()),
        created_at: from_iso(&created_at).unwrap_or_else(|_| Utc::now()),
        updated_at: from_iso(&updated_at).unwrap_or_else(|_| Utc::now()),
    })
}

fn row_to_synapse(row: &rusqlite::Row<'_>) -> rusqlite::Result<Synapse> {
    let metadata_json: Option<String> = row.get(5)?;
    let last_fired: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(Synapse {
        id: row.get(0)?,
        source_id: row.get(1)?,
        target_id: row.get(2)?,
        weight: row.get(3)?,
        synapse_type: row.get(4)?,
        metadata: metadata_json.and_then(|s| serde_json::from_str(&s).ok()),
        fire_count: row.get(6)?,
        last_fired: last_fired.and_then(|s| from_iso(&s).ok()),
        created_at: from_iso(&created_at).unwrap_or_else(|_| Utc::now()),
    })
}

fn row_to_indexed_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedFile> {
    let last_indexed: String = row.get(3)?;
    Ok(IndexedFile {
        path: row.get(0)?,
        language: row.get(1)?,
        neuron_count: row.get(2)?,
        last_indexed: from_iso(&last_indexed).unwrap_or_else(|_| Utc::now()),
        content_hash: row.get(4)?,
    })
}

fn row_to_query_log_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryLogEntry> {
    let activated_json: String = row.get(2)?;
    let used_json: Option<String> = row.get(3)?;
    let timestamp: String = row.get(4)?;
    Ok(QueryLogEntry {
        id: row.get(0)?,
        query: row.get(1)?,
        activated_neuron_ids: serde_json::from_str(&activated_json).unwrap_or_default(),
        used_neuron_ids: used_json.and_then(|s| serde_json::from_str(&s).ok()),
        timestamp: from_iso(&timestamp).unwrap_or_else(|_| Utc::now()),
    })
}

// ============================================================================
// SERIALIZATION HELPERS
// ============================================================================

fn to_iso(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn from_iso(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}
