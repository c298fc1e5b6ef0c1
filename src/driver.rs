//! The boundary between this engine and a live database connection.
//!
//! A concrete driver (rusqlite, a Postgres client, a MySQL client, ...) is
//! explicitly out of scope for this crate -- only the trait the
//! orchestrator consumes lives here. `tests/support` carries a
//! `rusqlite`-backed implementation used purely to exercise generated SQL
//! against a real engine.

use crate::model::Value;

/// One result row: an ordered list of column name/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<(String, Value)>);

impl Row {
    /// The value for `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }
}

/// An opaque error surfaced by a `Driver` implementation. The orchestrator
/// wraps this into [`crate::error::AlphaDbError::Driver`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        DriverError(message.into())
    }
}

/// A synchronous connection to a managed database.
///
/// Single-threaded and synchronous per connection, matching the
/// specification's concurrency model: the orchestrator never retains a
/// driver across calls, so implementations do not need interior
/// mutability for their own sake.
pub trait Driver {
    /// Execute a statement with no expected result set. Returns the
    /// number of rows affected where the underlying engine reports one.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Execute a query and return its first row, if any.
    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, DriverError>;

    /// Execute a query and return every row.
    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;
}
