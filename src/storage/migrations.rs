//! Database migrations
//!
//! Schema migration definitions for the store. `schema_version` lives in the
//! `_meta` key-value table rather than a dedicated table. Migrations apply
//! forward only and are idempotent: running them twice against an
//! up-to-date store is a no-op.

/// A single schema migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

/// Current schema version known to this crate. Opening a store whose
/// `_meta.schema_version` exceeds this is a fatal error at open time.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Migration definitions, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: neurons, synapses, indexed_files, query_log",
    up: MIGRATION_V1_UP,
}];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS _meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS neurons (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    embedding BLOB,
    file_path TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    type TEXT NOT NULL DEFAULT 'function',
    name TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT '',
    activation_count INTEGER NOT NULL DEFAULT 0,
    last_activated TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_neurons_file_path ON neurons(file_path);
CREATE INDEX IF NOT EXISTS idx_neurons_type ON neurons(type);
CREATE INDEX IF NOT EXISTS idx_neurons_name ON neurons(name);

CREATE TABLE IF NOT EXISTS synapses (
    id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL REFERENCES neurons(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES neurons(id) ON DELETE CASCADE,
    weight REAL NOT NULL,
    type TEXT NOT NULL,
    metadata TEXT,
    fire_count INTEGER NOT NULL DEFAULT 0,
    last_fired TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(source_id, target_id, type)
);

CREATE INDEX IF NOT EXISTS idx_synapses_source ON synapses(source_id);
CREATE INDEX IF NOT EXISTS idx_synapses_target ON synapses(target_id);
CREATE INDEX IF NOT EXISTS idx_synapses_type ON synapses(type);

CREATE TABLE IF NOT EXISTS indexed_files (
    path TEXT PRIMARY KEY,
    language TEXT NOT NULL DEFAULT '',
    neuron_count INTEGER NOT NULL DEFAULT 0,
    last_indexed TEXT NOT NULL,
    content_hash TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS query_log (
    id TEXT PRIMARY KEY,
    query TEXT NOT NULL,
    activated_neuron_ids TEXT NOT NULL DEFAULT '[]',
    used_neuron_ids TEXT,
    timestamp TEXT NOT NULL
);

INSERT OR IGNORE INTO _meta (key, value) VALUES ('schema_version', '1');
"#;

/// Read the current schema version from `_meta`, defaulting to 0 for a
/// brand-new database file.
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_meta'",
            [],
            |_| Ok(true),
        )
        .unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT value FROM _meta WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse().unwrap_or(0))
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(0),
        other => Err(other),
    })
}

/// Apply all pending migrations. Returns the number applied.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            conn.execute_batch(migration.up)?;
            conn.execute(
                "INSERT INTO _meta (key, value) VALUES ('schema_version', ?1)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [migration.version.to_string()],
            )?;
            applied += 1;
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&conn).unwrap(), 1);
        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(apply_migrations(&conn).unwrap(), 0);
    }

    #[test]
    fn test_fresh_db_has_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), 0);
    }
}
