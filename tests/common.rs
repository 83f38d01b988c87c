// ABOUTME: Shared test utilities: quiet logging setup and a scripted mock pool
// ABOUTME: The mock records issued statements and counts connection leases and drops
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use querykit::{ConnectionPool, PooledConnection, Row, Rows};
use serde_json::Value;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Scripted outcome for one query execution.
pub enum Outcome {
    Rows(Rows),
    Fail(&'static str),
}

struct MockState {
    outcomes: Mutex<VecDeque<Outcome>>,
    fail_connect: AtomicBool,
    connects: AtomicUsize,
    releases: AtomicUsize,
    statements: Mutex<Vec<(String, Vec<Value>)>>,
}

/// Connection pool double driven by a fixed outcome script. Each `query`
/// call consumes the next outcome; an exhausted script yields empty row
/// sets. Lease drops are counted through the connection's `Drop` impl.
#[derive(Clone)]
pub struct MockPool {
    state: Arc<MockState>,
}

impl MockPool {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        init_test_logging();
        Self {
            state: Arc::new(MockState {
                outcomes: Mutex::new(outcomes.into()),
                fail_connect: AtomicBool::new(false),
                connects: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
                statements: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A pool whose every lease attempt fails.
    pub fn failing_connect() -> Self {
        let pool = Self::new(Vec::new());
        pool.state.fail_connect.store(true, Ordering::SeqCst);
        pool
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    /// Every statement issued so far, as (text, params) pairs.
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.state.statements.lock().unwrap().clone()
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
}

#[async_trait]
impl ConnectionPool for MockPool {
    type Conn = MockConnection;

    async fn connect(&self) -> Result<Self::Conn> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(anyhow!("pool exhausted"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl PooledConnection for MockConnection {
    async fn query(&mut self, text: &str, params: &[Value]) -> Result<Rows> {
        self.state
            .statements
            .lock()
            .unwrap()
            .push((text.to_owned(), params.to_vec()));
        match self.state.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Rows(rows)) => Ok(rows),
            Some(Outcome::Fail(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a result row from column/value pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

/// Build a record from column/value pairs.
pub fn record(pairs: &[(&str, Value)]) -> querykit::Record {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}
