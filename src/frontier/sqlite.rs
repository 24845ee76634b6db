//! SQLite frontier implementation
//!
//! An embedded stand-in for the remote key-value service, providing the same
//! partition operations from a single database file.

use crate::frontier::schema::initialize_schema;
use crate::frontier::traits::{Entries, Frontier, FrontierError, FrontierResult};
use crate::frontier::Partition;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite frontier backend
pub struct SqliteFrontier {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteFrontier {
    /// Opens (or creates) the frontier database at `path`
    pub fn open(path: &Path) -> FrontierResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory frontier; backups are a no-op
    pub fn open_in_memory() -> FrontierResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Location of the backup written by [`Frontier::backup`]
    pub fn backup_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| {
            let mut name = path.as_os_str().to_os_string();
            name.push(".bak");
            PathBuf::from(name)
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn create_partitions_sync(&self, partitions: &[Partition]) -> FrontierResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for partition in partitions {
            tx.execute(
                "INSERT OR IGNORE INTO partitions (name) VALUES (?1)",
                params![partition.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_entries_sync(&self, partition: Partition) -> FrontierResult<Vec<(String, u32)>> {
        let conn = self.lock();
        ensure_partition(&conn, partition)?;

        let mut stmt =
            conn.prepare("SELECT url, tries FROM entries WHERE partition = ?1 ORDER BY queued_at, rowid")?;
        let rows = stmt.query_map(params![partition.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let collected = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(collected)
    }

    fn has_keys_sync(
        &self,
        partitions: &[Partition],
        keys: &[String],
    ) -> FrontierResult<HashMap<String, bool>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT partition FROM entries WHERE url = ?1")?;

        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let partition: Option<String> = stmt
                .query_row(params![key], |row| row.get(0))
                .optional()?;
            let present = partition
                .and_then(|name| Partition::from_name(&name))
                .map(|p| partitions.contains(&p))
                .unwrap_or(false);
            found.insert(key.clone(), present);
        }

        Ok(found)
    }

    fn upsert_sync(&self, partition: Partition, entries: &Entries) -> FrontierResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        ensure_partition(&tx, partition)?;

        let now = queue_timestamp();
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO entries (url, partition, tries, queued_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (url, tries) in entries {
                stmt.execute(params![url, partition.as_str(), tries, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn pop_sync(&self, partition: Partition, max: usize) -> FrontierResult<Entries> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        ensure_partition(&tx, partition)?;

        let popped = {
            let mut stmt = tx.prepare(
                "SELECT url, tries FROM entries WHERE partition = ?1 ORDER BY queued_at, rowid LIMIT ?2",
            )?;
            let limit = i64::try_from(max).unwrap_or(i64::MAX);
            let rows = stmt.query_map(params![partition.as_str(), limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })?;
            let collected = rows.collect::<Result<Vec<_>, _>>()?;
            collected
        };

        {
            let mut delete = tx.prepare("DELETE FROM entries WHERE url = ?1")?;
            for (url, _) in &popped {
                delete.execute(params![url])?;
            }
        }

        tx.commit()?;
        Ok(popped.into_iter().collect())
    }

    fn backup_sync(&self) -> FrontierResult<()> {
        let Some(backup_path) = self.backup_path() else {
            return Ok(());
        };

        // VACUUM INTO refuses to overwrite an existing file
        match std::fs::remove_file(&backup_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let conn = self.lock();
        conn.execute(
            "VACUUM INTO ?1",
            params![backup_path.to_string_lossy().into_owned()],
        )?;
        tracing::debug!("Backed up frontier to {}", backup_path.display());
        Ok(())
    }
}

/// Fixed-width UTC timestamp, so text order is time order
fn queue_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fails with `UnknownPartition` unless the partition was created
fn ensure_partition(conn: &Connection, partition: Partition) -> FrontierResult<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM partitions WHERE name = ?1",
            params![partition.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match exists {
        Some(_) => Ok(()),
        None => Err(FrontierError::UnknownPartition(partition.to_string())),
    }
}

#[async_trait]
impl Frontier for SqliteFrontier {
    async fn create_partitions(&self, partitions: &[Partition]) -> FrontierResult<()> {
        self.create_partitions_sync(partitions)
    }

    async fn list_keys(&self, partition: Partition) -> FrontierResult<Vec<String>> {
        Ok(self
            .list_entries_sync(partition)?
            .into_iter()
            .map(|(url, _)| url)
            .collect())
    }

    async fn list_entries(&self, partition: Partition) -> FrontierResult<Entries> {
        Ok(self.list_entries_sync(partition)?.into_iter().collect())
    }

    async fn has_keys(
        &self,
        partitions: &[Partition],
        keys: &[String],
    ) -> FrontierResult<HashMap<String, bool>> {
        self.has_keys_sync(partitions, keys)
    }

    async fn upsert(&self, partition: Partition, entries: &Entries) -> FrontierResult<()> {
        self.upsert_sync(partition, entries)
    }

    async fn pop(&self, partition: Partition, max: usize) -> FrontierResult<Entries> {
        self.pop_sync(partition, max)
    }

    async fn backup(&self) -> FrontierResult<()> {
        self.backup_sync()
    }
}
