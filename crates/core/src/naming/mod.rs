//! Field-name to column-name translation.
//!
//! [`to_snake`] is the default naming strategy: it turns struct-style
//! identifiers (`userID`, `CreatedAt`) into column names (`user_id`,
//! `created_at`). [`NameMapper`] wraps a strategy with a lookup table so
//! each field is mapped once.

pub mod mapper;
pub mod snake;

pub use mapper::{NameFn, NameMapper};
pub use snake::{to_snake, validate_identifier};
