//! Single-row, multi-row and exec helpers, with named-argument variants.
//!
//! The functions here run against a bare connection; [`Database`] and
//! [`Tx`] expose them as methods so the same calls work inside and outside
//! a transaction.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use super::named::{bind_named, rebind, Args};
use super::rows::{FromRow, MappedRow};
use super::{Database, Tx};
use crate::errors::DatabaseError;
use crate::naming::NameMapper;

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

fn get<T: FromRow>(
    conn: &Connection,
    names: &NameMapper,
    sql: &str,
    args: &[Value],
) -> Result<T, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    match rows.next()? {
        Some(row) => Ok(T::from_row(&MappedRow::new(row, names))?),
        None => Err(DatabaseError::NoRows),
    }
}

fn select<T: FromRow>(
    conn: &Connection,
    names: &NameMapper,
    sql: &str,
    args: &[Value],
) -> Result<Vec<T>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(T::from_row(&MappedRow::new(row, names))?);
    }
    Ok(out)
}

fn exec(conn: &Connection, sql: &str, args: &[Value]) -> Result<usize, DatabaseError> {
    Ok(conn.execute(sql, params_from_iter(args.iter()))?)
}

/// Bind `:name` placeholders and reject list arguments.
fn bind_values(
    names: &NameMapper,
    query: &str,
    args: &Args,
) -> Result<(String, Vec<Value>), DatabaseError> {
    let (sql, values) = bind_named(query, args, names)?.into_values()?;
    let sql = rebind(&sql)?;
    debug!(sql = %sql, args = values.len(), "bound named query");
    Ok((sql, values))
}

fn named_in(
    names: &NameMapper,
    query: &str,
    args: &Args,
) -> Result<(String, Vec<Value>), DatabaseError> {
    let (sql, values) = bind_named(query, args, names)?.expand_in()?;
    let sql = rebind(&sql)?;
    debug!(sql = %sql, args = values.len(), "expanded named query");
    Ok((sql, values))
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

impl Database {
    /// Bind `:name` placeholders from `args`, expand list arguments into
    /// `?, ?, ...`, and number the placeholders.
    ///
    /// The returned query and values can be passed to [`get`](Self::get),
    /// [`select`](Self::select) or [`exec`](Self::exec).
    pub fn named_in(&self, query: &str, args: &Args) -> Result<(String, Vec<Value>), DatabaseError> {
        named_in(self.names(), query, args)
    }

    /// Fetch the first row of a named query.
    ///
    /// Returns [`DatabaseError::NoRows`] if the result set is empty.
    pub fn named_get<T: FromRow>(&self, query: &str, args: &Args) -> Result<T, DatabaseError> {
        let (sql, values) = bind_values(self.names(), query, args)?;
        self.get(&sql, &values)
    }

    /// Fetch every row of a named query.
    pub fn named_select<T: FromRow>(
        &self,
        query: &str,
        args: &Args,
    ) -> Result<Vec<T>, DatabaseError> {
        let (sql, values) = bind_values(self.names(), query, args)?;
        self.select(&sql, &values)
    }

    /// Execute a named statement, returning the number of changed rows.
    pub fn named_exec(&self, query: &str, args: &Args) -> Result<usize, DatabaseError> {
        let (sql, values) = bind_values(self.names(), query, args)?;
        self.exec(&sql, &values)
    }

    /// Fetch the first row of a positional query.
    pub fn get<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<T, DatabaseError> {
        get(&self.conn(), self.names(), sql, args)
    }

    /// Fetch every row of a positional query.
    pub fn select<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>, DatabaseError> {
        select(&self.conn(), self.names(), sql, args)
    }

    /// Execute a positional statement, returning the number of changed rows.
    pub fn exec(&self, sql: &str, args: &[Value]) -> Result<usize, DatabaseError> {
        exec(&self.conn(), sql, args)
    }
}

// ---------------------------------------------------------------------------
// Tx
// ---------------------------------------------------------------------------

impl Tx<'_> {
    /// Transaction-scoped [`Database::named_in`].
    pub fn named_in(&self, query: &str, args: &Args) -> Result<(String, Vec<Value>), DatabaseError> {
        named_in(self.names, query, args)
    }

    /// Transaction-scoped [`Database::named_get`].
    pub fn named_get<T: FromRow>(&self, query: &str, args: &Args) -> Result<T, DatabaseError> {
        let (sql, values) = bind_values(self.names, query, args)?;
        self.get(&sql, &values)
    }

    /// Transaction-scoped [`Database::named_select`].
    pub fn named_select<T: FromRow>(
        &self,
        query: &str,
        args: &Args,
    ) -> Result<Vec<T>, DatabaseError> {
        let (sql, values) = bind_values(self.names, query, args)?;
        self.select(&sql, &values)
    }

    /// Transaction-scoped [`Database::named_exec`].
    pub fn named_exec(&self, query: &str, args: &Args) -> Result<usize, DatabaseError> {
        let (sql, values) = bind_values(self.names, query, args)?;
        self.exec(&sql, &values)
    }

    pub fn get<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<T, DatabaseError> {
        get(&self.conn, self.names, sql, args)
    }

    pub fn select<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>, DatabaseError> {
        select(&self.conn, self.names, sql, args)
    }

    pub fn exec(&self, sql: &str, args: &[Value]) -> Result<usize, DatabaseError> {
        exec(&self.conn, sql, args)
    }
}
