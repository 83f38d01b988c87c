// ABOUTME: The four public query operations: insert, update, has, get_value
// ABOUTME: Shared sanitize/build/execute core with a bounded single-retry loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Error;
use crate::pool::{ConnectionPool, PooledConnection, Record, Rows};

/// Upper bound on execution attempts per statement: the first try plus
/// exactly one retry.
pub const MAX_ATTEMPTS: usize = 2;

/// Insert `record` into `table`, dropping null-valued fields first.
///
/// Placeholders are 1-indexed in the record's key order; the parameter list
/// follows the same order. When `returning` names at least one column, a
/// `RETURNING` clause is appended and the produced rows come back in
/// `Some(rows)`.
///
/// Returns `Ok(None)` without touching the database when every field of
/// `record` is null.
///
/// # Errors
///
/// [`Error::QueryFailed`] after two failed executions, [`Error::Connect`]
/// when no connection could be leased.
pub async fn insert<P: ConnectionPool>(
    pool: &P,
    record: &Record,
    table: &str,
    returning: Option<&[&str]>,
) -> Result<Option<Rows>, Error> {
    let fields = sanitize(record);
    if fields.is_empty() {
        return Ok(None);
    }

    let (text, params) = build_insert(&fields, table, returning);
    let rows = execute_with_retry(pool, &text, &params).await?;
    Ok(Some(rows))
}

/// Update `table`, setting the non-null fields of `record` where every
/// condition in `conditions` holds (conditions are ANDed in slice order).
///
/// SET placeholders occupy `$1..$k` in record key order; WHERE placeholders
/// continue at `$k+1` in condition order. The parameter list is the SET
/// values followed by the WHERE values.
///
/// A record whose every field is null is a no-op: `Ok(())` with zero
/// statements issued.
///
/// # Errors
///
/// [`Error::QueryFailed`] after two failed executions, [`Error::Connect`]
/// when no connection could be leased.
pub async fn update<P: ConnectionPool>(
    pool: &P,
    record: &Record,
    table: &str,
    conditions: &[(&str, Value)],
) -> Result<(), Error> {
    let fields = sanitize(record);
    if fields.is_empty() {
        return Ok(());
    }

    let (text, params) = build_update(&fields, table, conditions);
    execute_with_retry(pool, &text, &params).await?;
    Ok(())
}

/// Execute a raw, caller-supplied query and report whether it produced at
/// least one row. Non-row-returning statements count as zero rows.
///
/// # Errors
///
/// [`Error::QueryFailed`] after two failed executions, [`Error::Connect`]
/// when no connection could be leased.
pub async fn has<P: ConnectionPool>(pool: &P, query: &str) -> Result<bool, Error> {
    let rows = execute_with_retry(pool, query, &[]).await?;
    Ok(!rows.is_empty())
}

/// Execute a raw, caller-supplied query and return its row set as-is.
///
/// # Errors
///
/// [`Error::QueryFailed`] after two failed executions, [`Error::Connect`]
/// when no connection could be leased.
pub async fn get_value<P: ConnectionPool>(pool: &P, query: &str) -> Result<Rows, Error> {
    execute_with_retry(pool, query, &[]).await
}

/// Filtered view of a record with null-valued fields removed. The caller's
/// map is left untouched.
fn sanitize(record: &Record) -> Vec<(&str, &Value)> {
    record
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.as_str(), value))
        .collect()
}

fn build_insert(
    fields: &[(&str, &Value)],
    table: &str,
    returning: Option<&[&str]>,
) -> (String, Vec<Value>) {
    let columns = fields
        .iter()
        .map(|(key, _)| (*key).to_owned())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=fields.len())
        .map(|ordinal| format!("${ordinal}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
    if let Some(cols) = returning.filter(|cols| !cols.is_empty()) {
        let cols = cols.join(", ");
        text.push_str(" RETURNING ");
        text.push_str(&cols);
    }

    let params = fields.iter().map(|(_, value)| (*value).clone()).collect();
    (text, params)
}

fn build_update(
    fields: &[(&str, &Value)],
    table: &str,
    conditions: &[(&str, Value)],
) -> (String, Vec<Value>) {
    let set_clauses = fields
        .iter()
        .enumerate()
        .map(|(index, (key, _))| {
            let ordinal = index + 1;
            format!("{key} = ${ordinal}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    // WHERE placeholders continue right after the last SET placeholder.
    let where_clauses = conditions
        .iter()
        .enumerate()
        .map(|(index, (column, _))| {
            let ordinal = fields.len() + index + 1;
            format!("{column} = ${ordinal}")
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    let text = format!("UPDATE {table} SET {set_clauses} WHERE {where_clauses}");

    let mut params: Vec<Value> = fields.iter().map(|(_, value)| (*value).clone()).collect();
    params.extend(conditions.iter().map(|(_, value)| value.clone()));
    (text, params)
}

/// Lease a connection, execute, and retry the identical statement once on
/// failure. The lease drops on every exit path; the retry leases a fresh
/// connection after the first one has been released.
async fn execute_with_retry<P: ConnectionPool>(
    pool: &P,
    text: &str,
    params: &[Value],
) -> Result<Rows, Error> {
    let mut attempt = 0;
    loop {
        let mut conn = pool.connect().await.map_err(Error::Connect)?;
        debug!(query = text, attempt, "executing statement");

        match conn.query(text, params).await {
            Ok(rows) => return Ok(rows),
            Err(source) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(Error::QueryFailed {
                        query: text.to_owned(),
                        source,
                    });
                }
                warn!(query = text, error = %source, "statement failed, retrying once");
            }
        }
    }
}
