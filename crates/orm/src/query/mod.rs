//! Table-scoped statement builder
//!
//! Renders the handful of statements a model issues against its table:
//! - `builder`: `TableQuery` and the SELECT forms (existence probe, first match)
//! - `dml`: INSERT ... RETURNING, UPDATE and DELETE keyed by a single field
//!
//! NULL values are rendered as SQL literals rather than bound, so a NULL
//! never carries a parameter type that conflicts with the target column.

pub mod builder;
pub mod dml;

pub use builder::TableQuery;

use crate::backends::DatabaseValue;

/// A rendered statement and its bound parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}
