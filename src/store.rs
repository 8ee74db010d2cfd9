//! SQLite-backed notification store, one database per source.
//!
//! # Responsibility
//! - Own one connection per [`Source`] partition.
//! - Ensure the `notifications` schema before anything else touches it.
//! - Append scraped records with duplicate suppression; read them back.
//!
//! # Invariants
//! - Partitions share no connection, file or lock.
//! - Every call holds its partition's lock for its whole duration, so a
//!   reader observes either the state before or after an append, never part of it.
//! - `(title, url)` is unique within a partition.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rusqlite::{Connection, params};
use tracing::{debug, info, instrument, warn};

use crate::errors::StorageError;
use crate::models::{AppendOutcome, NotificationRecord};
use crate::sources::Source;

pub type StorageResult<T> = Result<T, StorageError>;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL
    );
    DELETE FROM notifications
    WHERE id NOT IN (SELECT MIN(id) FROM notifications GROUP BY title, url);
    CREATE UNIQUE INDEX IF NOT EXISTS notifications_title_url
        ON notifications (title, url);
";

const INSERT_SQL: &str = "INSERT OR IGNORE INTO notifications (title, url) VALUES (?1, ?2)";

const SELECT_ALL_SQL: &str = "SELECT title, url FROM notifications
    WHERE title IS NOT NULL AND url IS NOT NULL
    ORDER BY id";

const COUNT_SQL: &str = "SELECT COUNT(*) FROM notifications
    WHERE title IS NOT NULL AND url IS NOT NULL";

/// Partitioned notification store.
pub struct Store {
    partitions: HashMap<Source, Mutex<Connection>>,
}

impl Store {
    /// Open (or create) one database file per source under `dir` and ensure
    /// every partition's schema.
    #[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut partitions = HashMap::new();
        for source in Source::ALL {
            let path = dir.join(source.database_file());
            let conn = Connection::open(&path).map_err(sqlite(source))?;
            conn.busy_timeout(Duration::from_secs(5)).map_err(sqlite(source))?;
            debug!(%source, path = %path.display(), "Opened partition");
            partitions.insert(source, Mutex::new(conn));
        }
        Self::bootstrap(partitions)
    }

    /// In-memory variant of [`Store::open`], used by tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        let mut partitions = HashMap::new();
        for source in Source::ALL {
            let conn = Connection::open_in_memory().map_err(sqlite(source))?;
            partitions.insert(source, Mutex::new(conn));
        }
        Self::bootstrap(partitions)
    }

    fn bootstrap(partitions: HashMap<Source, Mutex<Connection>>) -> StorageResult<Self> {
        let store = Self { partitions };
        for source in Source::ALL {
            store.ensure_schema(source)?;
        }
        Ok(store)
    }

    /// Create the partition's table and unique index if absent.
    ///
    /// Idempotent. Databases written before the unique index existed are
    /// cleaned of duplicate `(title, url)` rows, keeping the oldest.
    #[instrument(level = "info", skip(self))]
    pub fn ensure_schema(&self, source: Source) -> StorageResult<()> {
        let started_at = Instant::now();
        let mut conn = self.lock(source)?;
        let tx = conn.transaction().map_err(sqlite(source))?;
        tx.execute_batch(SCHEMA_SQL).map_err(sqlite(source))?;
        tx.commit().map_err(sqlite(source))?;
        info!(
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Partition schema ensured"
        );
        Ok(())
    }

    /// Insert `records` in order, in a single transaction.
    ///
    /// Records already present are counted as duplicates; records violating
    /// [`NotificationRecord::is_valid`] are counted as rejected. Neither fails
    /// the batch.
    #[instrument(level = "info", skip(self, records), fields(count = records.len()))]
    pub fn append(
        &self,
        source: Source,
        records: &[NotificationRecord],
    ) -> StorageResult<AppendOutcome> {
        let mut outcome = AppendOutcome::default();
        let mut conn = self.lock(source)?;
        let tx = conn.transaction().map_err(sqlite(source))?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL).map_err(sqlite(source))?;
            for record in records {
                if !record.is_valid() {
                    warn!(title = %record.title, url = %record.url, "Rejecting malformed record");
                    outcome.rejected += 1;
                    continue;
                }
                let changed = stmt
                    .execute(params![record.title, record.url])
                    .map_err(sqlite(source))?;
                if changed == 0 {
                    outcome.duplicates += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
        }
        tx.commit().map_err(sqlite(source))?;
        info!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            rejected = outcome.rejected,
            "Appended notifications"
        );
        Ok(outcome)
    }

    /// Every stored record for `source`, oldest first.
    #[instrument(level = "debug", skip(self))]
    pub fn read_all(&self, source: Source) -> StorageResult<Vec<NotificationRecord>> {
        let conn = self.lock(source)?;
        let mut stmt = conn.prepare_cached(SELECT_ALL_SQL).map_err(sqlite(source))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NotificationRecord {
                    title: row.get(0)?,
                    url: row.get(1)?,
                })
            })
            .map_err(sqlite(source))?;
        let records = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(sqlite(source))?;
        debug!(count = records.len(), "Read partition");
        Ok(records)
    }

    /// Number of records [`Store::read_all`] would return for `source`.
    pub fn count(&self, source: Source) -> StorageResult<usize> {
        let conn = self.lock(source)?;
        let count: i64 = conn
            .query_row(COUNT_SQL, [], |row| row.get(0))
            .map_err(sqlite(source))?;
        Ok(count as usize)
    }

    fn lock(&self, source: Source) -> StorageResult<MutexGuard<'_, Connection>> {
        self.partitions
            .get(&source)
            .ok_or(StorageError::MissingPartition(source.key()))?
            .lock()
            .map_err(|_| StorageError::Poisoned(source.key()))
    }
}

fn sqlite(source: Source) -> impl Fn(rusqlite::Error) -> StorageError {
    move |err| StorageError::Sqlite {
        partition: source.key(),
        source: err,
    }
}
