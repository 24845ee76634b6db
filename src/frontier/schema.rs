//! Database schema for the embedded frontier

use rusqlite::Connection;

/// SQL schema for the database
///
/// Entries are keyed by URL alone, so a URL can only ever sit in one
/// partition. Pops are served oldest `queued_at` first, ties broken by
/// rowid; an upsert stamps the entry again, sending a re-queued URL to the
/// back of the queue.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS partitions (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS entries (
    url TEXT NOT NULL UNIQUE,
    partition TEXT NOT NULL REFERENCES partitions(name),
    tries INTEGER NOT NULL DEFAULT 0,
    queued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_queue ON entries(partition, queued_at);
"#;

/// Creates the tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
