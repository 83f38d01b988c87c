// ABOUTME: sqlx-backed implementation of the pool seam for PostgreSQL
// ABOUTME: Binds serde_json values as positional parameters and decodes rows to JSON maps
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _};
use uuid::Uuid;

use crate::pool::{ConnectionPool, PooledConnection, Row, Rows};

/// Adapter exposing an existing [`sqlx::PgPool`] through the
/// [`ConnectionPool`] seam. The pool is supplied by the caller; this handle
/// never reconfigures it.
#[derive(Clone)]
pub struct PgPoolHandle {
    pool: PgPool,
}

impl PgPoolHandle {
    /// Wrap a caller-owned pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// A connection leased from a [`PgPoolHandle`]. Dropping it returns the
/// connection to the pool.
pub struct PgPooledConnection {
    conn: sqlx::pool::PoolConnection<Postgres>,
}

#[async_trait]
impl ConnectionPool for PgPoolHandle {
    type Conn = PgPooledConnection;

    async fn connect(&self) -> Result<Self::Conn> {
        let conn = self.pool.acquire().await?;
        Ok(PgPooledConnection { conn })
    }
}

#[async_trait]
impl PooledConnection for PgPooledConnection {
    async fn query(&mut self, text: &str, params: &[Value]) -> Result<Rows> {
        let mut query = sqlx::query(text);
        for param in params {
            query = bind_value(query, param);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;
        Ok(rows.iter().map(row_to_map).collect())
    }
}

/// Bind one JSON value as the next positional parameter. Scalars map to
/// their natural Postgres types; arrays and objects are bound as JSONB.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<&str>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                query.bind(integer)
            } else {
                query.bind(number.as_f64())
            }
        }
        Value::String(text) => query.bind(text.as_str()),
        composite @ (Value::Array(_) | Value::Object(_)) => query.bind(composite.clone()),
    }
}

fn row_to_map(row: &PgRow) -> Row {
    let mut map = Row::new();
    for column in row.columns() {
        map.insert(column.name().to_owned(), decode_column(row, column.ordinal()));
    }
    map
}

/// Decode a column into a JSON value by trying the common Postgres scalar
/// types in turn. Types outside this set decode as null.
fn decode_column(row: &PgRow, ordinal: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(ordinal) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(ordinal) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(ordinal) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(ordinal) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(ordinal) {
        return value.map_or(Value::Null, Value::from);
    }
    if let Ok(value) = row.try_get::<Option<Uuid>, _>(ordinal) {
        return value.map_or(Value::Null, |id| Value::from(id.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<DateTime<Utc>>, _>(ordinal) {
        return value.map_or(Value::Null, |stamp| Value::from(stamp.to_rfc3339()));
    }
    if let Ok(value) = row.try_get::<Option<Value>, _>(ordinal) {
        return value.unwrap_or(Value::Null);
    }
    Value::Null
}
