//! sqlxx core library.
//!
//! A convenience layer over `rusqlite`: named-parameter binding with
//! `IN (...)` list expansion, single-row and multi-row fetch helpers,
//! transaction-scoped equivalents, and camelCase to snake_case column
//! mapping for struct fields.

pub mod config;
pub mod db;
pub mod errors;
pub mod naming;

// Re-exports for convenience.
pub use config::AppConfig;
pub use db::{Args, Database, FromRow, MappedRow, Tx, TxOptions};
pub use naming::{to_snake, NameMapper};
pub use rusqlite;
