//! Cached field-name to column-name mapping.
//!
//! [`NameMapper`] pairs a naming strategy with a lookup table. Fields can be
//! registered up front (validated and mapped once at startup) or mapped
//! lazily on first use; either way the strategy runs once per field.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::snake::{to_snake, validate_identifier};
use crate::errors::IdentifierError;

/// A column-naming strategy: struct field name in, column name out.
pub type NameFn = fn(&str) -> String;

/// Field-to-column translation table backed by a naming strategy.
///
/// Thread-safe: the table sits behind an `RwLock` so concurrent queries can
/// read it while new fields are being added.
#[derive(Debug)]
pub struct NameMapper {
    /// Strategy used for fields not yet in the table.
    strategy: NameFn,
    /// field name -> column name.
    columns: RwLock<HashMap<String, String>>,
}

impl NameMapper {
    /// Create a mapper around the given strategy with an empty table.
    pub fn new(strategy: NameFn) -> Self {
        Self {
            strategy,
            columns: RwLock::new(HashMap::new()),
        }
    }

    /// Return the column name for `field`, mapping and caching it on first
    /// use.
    pub fn column(&self, field: &str) -> String {
        {
            let columns = self
                .columns
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(column) = columns.get(field) {
                return column.clone();
            }
        }

        let column = (self.strategy)(field);
        let mut columns = self
            .columns
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        columns
            .entry(field.to_string())
            .or_insert(column)
            .clone()
    }

    /// Return the column name for `field` without adding it to the table.
    ///
    /// Used for keys that come and go at runtime, such as query argument
    /// names.
    pub fn map(&self, field: &str) -> String {
        let columns = self
            .columns
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match columns.get(field) {
            Some(column) => column.clone(),
            None => (self.strategy)(field),
        }
    }

    /// Validate and map a set of fields ahead of time.
    ///
    /// Nothing is added to the table if any field is invalid.
    pub fn register<I, S>(&self, fields: I) -> Result<(), IdentifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapped = Vec::new();
        for field in fields {
            let field = field.as_ref();
            validate_identifier(field)?;
            mapped.push((field.to_string(), (self.strategy)(field)));
        }

        let mut columns = self
            .columns
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (field, column) in mapped {
            debug!(field = %field, column = %column, "registered column mapping");
            columns.insert(field, column);
        }
        Ok(())
    }

    /// Number of fields currently in the table.
    pub fn len(&self) -> usize {
        self.columns
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::new(to_snake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(field: &str) -> String {
        field.to_ascii_uppercase()
    }

    #[test]
    fn test_default_strategy_is_snake_case() {
        let names = NameMapper::default();
        assert_eq!(names.column("accountID"), "account_id");
        assert_eq!(names.column("SomeIDOfEntity"), "some_id_of_entity");
    }

    #[test]
    fn test_column_is_cached() {
        let names = NameMapper::default();
        assert!(names.is_empty());
        names.column("createdAt");
        names.column("createdAt");
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_map_does_not_cache() {
        let names = NameMapper::default();
        assert_eq!(names.map("itemIds"), "item_ids");
        assert!(names.is_empty());

        names.register(["ownerID"]).unwrap();
        assert_eq!(names.map("ownerID"), "owner_id");
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_custom_strategy() {
        let names = NameMapper::new(upper);
        assert_eq!(names.column("userId"), "USERID");
    }

    #[test]
    fn test_register() {
        let names = NameMapper::default();
        names.register(["userID", "displayName"]).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.column("displayName"), "display_name");
    }

    #[test]
    fn test_register_rejects_invalid_field() {
        let names = NameMapper::default();
        let result = names.register(["userID", "bad-field"]);
        assert!(matches!(
            result,
            Err(IdentifierError::InvalidCharacter { ch: '-', .. })
        ));
        assert!(names.is_empty());
    }

    #[test]
    fn test_concurrent_lookups() {
        let names = std::sync::Arc::new(NameMapper::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let names = names.clone();
                std::thread::spawn(move || names.column("ownerID"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "owner_id");
        }
        assert_eq!(names.len(), 1);
    }
}
