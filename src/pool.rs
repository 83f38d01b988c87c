// ABOUTME: Connection-pool abstraction the query helpers operate over
// ABOUTME: Callers supply any pool implementing these traits; release is drop
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A column-name to value mapping supplied to [`crate::insert`] and
/// [`crate::update`]. Fields holding `Value::Null` are dropped before any
/// SQL is built.
pub type Record = serde_json::Map<String, Value>;

/// A single result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// The row set produced by one statement.
pub type Rows = Vec<Row>;

/// A connection pool handle injected by the caller.
///
/// This crate never constructs or configures a pool; concurrency limits and
/// fairness are entirely the pool's own policy.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Leased connection type. The lease returns to the pool when the value
    /// is dropped, so release happens on every exit path.
    type Conn: PooledConnection;

    /// Lease a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns the pool's own error when no connection can be leased.
    async fn connect(&self) -> Result<Self::Conn>;
}

/// A leased database connection.
#[async_trait]
pub trait PooledConnection: Send {
    /// Execute `text` with 1-indexed positional `params`, returning the row
    /// set. Statements that produce no rows yield an empty set.
    ///
    /// # Errors
    ///
    /// Returns the driver's error when execution fails.
    async fn query(&mut self, text: &str, params: &[Value]) -> Result<Rows>;
}
