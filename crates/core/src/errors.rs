//! Error types for the sqlxx core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

// ---------------------------------------------------------------------------
// Identifier errors
// ---------------------------------------------------------------------------

/// Errors from strict identifier validation.
///
/// [`to_snake`](crate::naming::to_snake) itself never fails; these are only
/// produced by [`validate_identifier`](crate::naming::validate_identifier)
/// and the registration path of [`NameMapper`](crate::naming::NameMapper).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier is the empty string.
    #[error("identifier must not be empty")]
    Empty,

    /// The identifier starts with a digit.
    #[error("identifier '{0}' starts with a digit")]
    LeadingDigit(String),

    /// The identifier contains a character outside `[A-Za-z0-9_]`.
    #[error("identifier '{identifier}' contains invalid character {ch:?}")]
    InvalidCharacter {
        identifier: String,
        ch: char,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Database errors
// ---------------------------------------------------------------------------

/// Errors from the database layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying rusqlite error, propagated unmodified.
    #[error("database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// A single-row fetch returned an empty result set.
    #[error("query returned no rows")]
    NoRows,

    /// A `:name` placeholder has no matching argument.
    #[error("no argument bound for placeholder ':{name}'")]
    MissingArgument {
        name: String,
    },

    /// A list argument was bound where only single values are accepted.
    #[error("argument ':{name}' is a list; use named_in to expand it")]
    UnexpectedList {
        name: String,
    },

    /// A list argument with no elements cannot be expanded.
    #[error("argument ':{name}' is an empty list")]
    EmptyList {
        name: String,
    },

    /// The number of `?` placeholders does not match the argument count.
    #[error("query has {placeholders} placeholders but {args} arguments were given")]
    ArgumentCount {
        placeholders: usize,
        args: usize,
    },

    /// A query mixes numbered `?NNN` placeholders with bare `?` or `:name`
    /// placeholders.
    #[error("query mixes {numbered} numbered placeholders with {bare} unnumbered ones")]
    MixedPlaceholders {
        numbered: usize,
        bare: usize,
    },
}

impl DatabaseError {
    /// Whether this error means a single-row fetch found nothing.
    pub fn is_no_rows(&self) -> bool {
        matches!(
            self,
            DatabaseError::NoRows | DatabaseError::SqliteError(rusqlite::Error::QueryReturnedNoRows)
        )
    }
}
