//! Mapping result rows onto Rust types.

use rusqlite::types::{FromSql, Value};
use rusqlite::{Row, Statement};

use crate::naming::NameMapper;

/// A result row paired with the column-naming strategy of the database it
/// came from.
pub struct MappedRow<'r, 's> {
    row: &'r Row<'s>,
    names: &'r NameMapper,
}

impl<'r, 's> MappedRow<'r, 's> {
    pub(crate) fn new(row: &'r Row<'s>, names: &'r NameMapper) -> Self {
        Self { row, names }
    }

    /// Read the column that corresponds to struct field `field`
    /// (`"createdAt"` reads column `created_at` with the default mapper).
    pub fn get<T: FromSql>(&self, field: &str) -> rusqlite::Result<T> {
        let column = self.names.column(field);
        self.row.get(column.as_str())
    }

    /// Read a column by position.
    pub fn get_index<T: FromSql>(&self, index: usize) -> rusqlite::Result<T> {
        self.row.get(index)
    }

    /// The underlying rusqlite row.
    pub fn raw(&self) -> &Row<'s> {
        self.row
    }
}

/// Types that can be built from one result row.
///
/// Implemented by hand for row structs, reading each field through
/// [`MappedRow::get`]:
///
/// ```
/// use sqlxx::db::{FromRow, MappedRow};
///
/// struct Account {
///     account_id: i64,
///     display_name: String,
/// }
///
/// impl FromRow for Account {
///     fn from_row(row: &MappedRow<'_, '_>) -> sqlxx::rusqlite::Result<Self> {
///         Ok(Self {
///             account_id: row.get("accountID")?,
///             display_name: row.get("displayName")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &MappedRow<'_, '_>) -> rusqlite::Result<Self>;
}

/// Scalars read the first column.
macro_rules! impl_from_row_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromRow for $t {
                fn from_row(row: &MappedRow<'_, '_>) -> rusqlite::Result<Self> {
                    row.get_index(0)
                }
            }
        )*
    };
}

impl_from_row_scalar!(i32, i64, u32, f64, bool, String, Vec<u8>, Value);

/// An untyped row: column names and values in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub columns: Vec<(String, Value)>,
}

impl RawRow {
    /// Look up a value by column name.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl FromRow for RawRow {
    fn from_row(row: &MappedRow<'_, '_>) -> rusqlite::Result<Self> {
        let stmt: &Statement<'_> = row.raw().as_ref();
        let mut columns = Vec::with_capacity(stmt.column_count());
        for i in 0..stmt.column_count() {
            let name = stmt.column_name(i)?.to_string();
            columns.push((name, row.get_index(i)?));
        }
        Ok(Self { columns })
    }
}
