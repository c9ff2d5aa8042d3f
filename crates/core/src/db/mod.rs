//! SQLite access layer.
//!
//! Provides a [`Database`] handle and a [`Tx`] transaction handle, both with
//! named-parameter query helpers (see [`queries`]) and row mapping through
//! the database's [`NameMapper`].

pub mod named;
pub mod queries;
pub mod rows;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::errors::DatabaseError;
use crate::naming::{NameFn, NameMapper};

pub use named::{bind_named, rebind, Arg, Args, BoundQuery};
pub use rows::{FromRow, MappedRow, RawRow};

/// Main database handle wrapping a SQLite connection.
///
/// The inner connection is wrapped in a `Mutex` so that `Database` is
/// `Send + Sync`, enabling use inside `Arc`.
pub struct Database {
    conn: Mutex<Connection>,
    names: NameMapper,
}

impl Database {
    /// Open (or create) a SQLite database at `path` with default settings.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let config = DatabaseConfig {
            path: path.as_ref().to_path_buf(),
            ..DatabaseConfig::default()
        };
        Self::from_config(&config)
    }

    /// Open (or create) the database described by `config`, applying its
    /// journal mode, busy timeout and foreign key setting.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = &config.path;
        info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};",
            config.journal_mode.as_str()
        ))?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        debug!(
            journal_mode = config.journal_mode.as_str(),
            foreign_keys = config.foreign_keys,
            busy_timeout_ms = config.busy_timeout_ms,
            "database opened successfully"
        );
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a pre-existing connection, using the default snake_case naming
    /// strategy.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            names: NameMapper::default(),
        }
    }

    /// Replace the column-naming strategy.
    pub fn with_name_mapper(mut self, strategy: NameFn) -> Self {
        self.names = NameMapper::new(strategy);
        self
    }

    /// The field-to-column mapper used for named arguments and row mapping.
    pub fn names(&self) -> &NameMapper {
        &self.names
    }

    /// Obtain a lock on the underlying connection.
    ///
    /// If the Mutex is poisoned (a previous holder panicked), the lock is
    /// recovered rather than propagating a panic.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("database mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Begin a transaction.
    ///
    /// The returned [`Tx`] holds the connection lock until it is committed,
    /// rolled back or dropped, so all work inside the transaction must go
    /// through the `Tx`; calling methods on this `Database` from the same
    /// thread meanwhile blocks forever.
    pub fn begin(&self, options: TxOptions) -> Result<Tx<'_>, DatabaseError> {
        let conn = self.conn();
        if options.read_only {
            conn.pragma_update(None, "query_only", true)?;
        }
        if let Err(e) = conn.execute_batch(options.behavior.begin_sql()) {
            if options.read_only {
                let _ = conn.pragma_update(None, "query_only", false);
            }
            return Err(e.into());
        }
        debug!(behavior = ?options.behavior, read_only = options.read_only, "transaction started");
        Ok(Tx {
            conn,
            names: &self.names,
            read_only: options.read_only,
            finished: false,
        })
    }

    /// Execute a closure inside a transaction. If the closure returns `Ok`,
    /// the transaction is committed; otherwise it is rolled back.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let tx = self.begin(TxOptions::default())?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

/// When SQLite acquires the write lock for a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxBehavior {
    /// Lock on first read/write.
    #[default]
    Deferred,
    /// Take the write lock immediately.
    Immediate,
    /// Take an exclusive lock immediately.
    Exclusive,
}

impl TxBehavior {
    fn begin_sql(self) -> &'static str {
        match self {
            TxBehavior::Deferred => "BEGIN DEFERRED",
            TxBehavior::Immediate => "BEGIN IMMEDIATE",
            TxBehavior::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// Options for [`Database::begin`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub behavior: TxBehavior,
    /// Reject writes for the duration of the transaction.
    pub read_only: bool,
}

/// An open transaction.
///
/// Dropping a `Tx` without calling [`commit`](Self::commit) rolls it back.
pub struct Tx<'db> {
    conn: MutexGuard<'db, Connection>,
    names: &'db NameMapper,
    read_only: bool,
    finished: bool,
}

impl Tx<'_> {
    /// Commit the transaction.
    pub fn commit(mut self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("COMMIT")?;
        self.finish();
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back the transaction.
    pub fn rollback(mut self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("ROLLBACK")?;
        self.finish();
        debug!("transaction rolled back");
        Ok(())
    }

    /// The connection the transaction runs on.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn finish(&mut self) {
        self.finished = true;
        if self.read_only {
            if let Err(e) = self.conn.pragma_update(None, "query_only", false) {
                warn!(error = %e, "failed to clear query_only after read-only transaction");
            }
        }
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "rollback of dropped transaction failed");
        } else {
            debug!("dropped transaction rolled back");
        }
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    fn setup_db() -> Database {
        let db = Database::in_memory().expect("failed to create in-memory db");
        db.conn()
            .execute_batch("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .unwrap();
        db
    }

    fn count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(&path).expect("failed to create file db");
        let mode: String = db
            .conn()
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
        assert!(path.exists());
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("cfg.db"),
            journal_mode: crate::config::JournalMode::Delete,
            foreign_keys: false,
            ..DatabaseConfig::default()
        };
        let db = Database::from_config(&config).unwrap();
        let fk: i64 = db
            .conn()
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 0);
    }

    #[test]
    fn test_transaction_commit() {
        let db = setup_db();
        db.transaction(|tx| {
            tx.exec(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)",
                &[Value::Text("a".into()), Value::Text("1".into())],
            )?;
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_transaction_rollback() {
        let db = setup_db();
        let result: Result<(), DatabaseError> = db.transaction(|tx| {
            tx.exec("INSERT INTO kv (key, value) VALUES ('b', '2')", &[])?;
            Err(DatabaseError::NoRows)
        });
        assert!(result.is_err());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_dropped_tx_rolls_back() {
        let db = setup_db();
        {
            let tx = db.begin(TxOptions::default()).unwrap();
            tx.exec("INSERT INTO kv (key, value) VALUES ('c', '3')", &[])
                .unwrap();
        }
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_explicit_rollback() {
        let db = setup_db();
        let tx = db
            .begin(TxOptions {
                behavior: TxBehavior::Immediate,
                read_only: false,
            })
            .unwrap();
        tx.exec("INSERT INTO kv (key, value) VALUES ('d', '4')", &[])
            .unwrap();
        tx.rollback().unwrap();
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_read_only_tx_rejects_writes() {
        let db = setup_db();
        let tx = db
            .begin(TxOptions {
                read_only: true,
                ..TxOptions::default()
            })
            .unwrap();
        let result = tx.exec("INSERT INTO kv (key, value) VALUES ('e', '5')", &[]);
        assert!(matches!(result, Err(DatabaseError::SqliteError(_))));
        tx.commit().unwrap();

        // query_only is cleared once the transaction ends.
        db.exec("INSERT INTO kv (key, value) VALUES ('e', '5')", &[])
            .unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_with_name_mapper() {
        fn lower(field: &str) -> String {
            field.to_ascii_lowercase()
        }
        let db = Database::in_memory().unwrap().with_name_mapper(lower);
        assert_eq!(db.names().column("UserID"), "userid");
    }
}
