// ABOUTME: Main library entry point for the querykit pooled-query helper
// ABOUTME: Re-exports the four query operations, the pool seam, and the error type
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # querykit
//!
//! A thin helper layer over a pooled `PostgreSQL` client. It provides exactly
//! four operations:
//!
//! - [`insert`]: parameterized INSERT with an optional RETURNING clause
//! - [`update`]: parameterized UPDATE with ANDed WHERE conditions
//! - [`has`]: existence check for a raw query string
//! - [`get_value`]: row-set fetch for a raw query string
//!
//! Each call sanitizes its input record (null-valued fields are dropped),
//! builds the SQL text with positional placeholders, leases a connection from
//! the injected pool, executes, and releases the connection on every exit
//! path. A failed execution is retried exactly once with identical inputs
//! before [`Error::QueryFailed`] surfaces the rendered query text.
//!
//! The pool itself is supplied by the caller through the [`ConnectionPool`]
//! seam; this crate never constructs or configures one. With the default
//! `postgres` feature, [`PgPoolHandle`] adapts an existing [`sqlx::PgPool`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use querykit::{insert, PgPoolHandle};
//! use serde_json::{json, Map};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let pool = PgPoolHandle::new(sqlx::PgPool::connect("postgres://localhost/app").await?);
//!
//! let mut record = Map::new();
//! record.insert("name".to_owned(), json!("a"));
//! record.insert("age".to_owned(), json!(null)); // dropped before the INSERT
//!
//! let rows = insert(&pool, &record, "users", Some(&["id"])).await?;
//! # Ok(())
//! # }
//! ```

/// Typed error surface for the query helpers
pub mod errors;

/// Connection-pool seam traits and record/row aliases
pub mod pool;

/// sqlx-backed pool adapter for `PostgreSQL`
#[cfg(feature = "postgres")]
pub mod postgres;

/// The four query operations and their shared retry core
pub mod query;

pub use errors::Error;
pub use pool::{ConnectionPool, PooledConnection, Record, Row, Rows};
#[cfg(feature = "postgres")]
pub use postgres::PgPoolHandle;
pub use query::{get_value, has, insert, update, MAX_ATTEMPTS};
