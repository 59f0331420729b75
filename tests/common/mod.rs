//! Scripted in-memory driver shared by the integration tests.
//!
//! Every driver call is appended to an event log so tests can assert on call
//! order. `run` calls (auto-commit and transactional) pop queued outcomes and
//! fall back to an empty result when the queue is empty.

#![allow(dead_code)]

use async_trait::async_trait;
use cypher_session::db::{
    BasicAuth, DEADLOCK_ERROR_CODE, DriverError, DriverFactory, DriverSession, DriverTransaction,
    GraphDriver, SessionConfig,
};
use cypher_session::models::{AccessMode, ConnectionParams, Params, ResultSet};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockState {
    events: Mutex<Vec<String>>,
    run_outcomes: Mutex<VecDeque<Result<ResultSet, DriverError>>>,
    connect_error: Mutex<Option<DriverError>>,
    begin_error: Mutex<Option<DriverError>>,
    commit_error: Mutex<Option<DriverError>>,
    rollback_error: Mutex<Option<DriverError>>,
    session_close_error: Mutex<Option<DriverError>>,
    driver_close_error: Mutex<Option<DriverError>>,
    last_params: Mutex<Option<Params>>,
}

impl MockState {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Number of events starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn push_result(&self, result: ResultSet) {
        self.run_outcomes.lock().unwrap().push_back(Ok(result));
    }

    pub fn push_error(&self, code: &str) {
        self.run_outcomes
            .lock()
            .unwrap()
            .push_back(Err(DriverError::new(code, "scripted failure")));
    }

    pub fn push_deadlock(&self) {
        self.push_error(DEADLOCK_ERROR_CODE);
    }

    pub fn fail_connect(&self, code: &str) {
        *self.connect_error.lock().unwrap() = Some(DriverError::new(code, "connect refused"));
    }

    pub fn fail_begin(&self, code: &str) {
        *self.begin_error.lock().unwrap() = Some(DriverError::new(code, "begin refused"));
    }

    pub fn fail_commit(&self, code: &str) {
        *self.commit_error.lock().unwrap() = Some(DriverError::new(code, "commit refused"));
    }

    pub fn fail_rollback(&self, code: &str) {
        *self.rollback_error.lock().unwrap() = Some(DriverError::new(code, "rollback refused"));
    }

    pub fn fail_session_close(&self, code: &str) {
        *self.session_close_error.lock().unwrap() = Some(DriverError::new(code, "close refused"));
    }

    pub fn fail_driver_close(&self, code: &str) {
        *self.driver_close_error.lock().unwrap() = Some(DriverError::new(code, "close refused"));
    }

    pub fn last_params(&self) -> Option<Params> {
        self.last_params.lock().unwrap().clone()
    }

    fn next_run(&self, params: &Params) -> Result<ResultSet, DriverError> {
        *self.last_params.lock().unwrap() = Some(params.clone());
        self.run_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ResultSet::default()))
    }

    fn take(slot: &Mutex<Option<DriverError>>) -> Result<(), DriverError> {
        match slot.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub struct MockFactory {
    pub state: Arc<MockState>,
}

impl MockFactory {
    pub fn new() -> (Arc<Self>, Arc<MockState>) {
        let state = Arc::new(MockState::default());
        (
            Arc::new(Self {
                state: state.clone(),
            }),
            state,
        )
    }
}

#[async_trait]
impl DriverFactory for MockFactory {
    async fn connect(
        &self,
        uri: &str,
        auth: &BasicAuth,
    ) -> Result<Arc<dyn GraphDriver>, DriverError> {
        MockState::take(&self.state.connect_error)?;
        self.state.record(format!("connect {uri} {}", auth.user));
        Ok(Arc::new(MockDriver {
            state: self.state.clone(),
            uri: uri.to_string(),
        }))
    }
}

struct MockDriver {
    state: Arc<MockState>,
    uri: String,
}

#[async_trait]
impl GraphDriver for MockDriver {
    async fn open_session(
        &self,
        config: SessionConfig,
    ) -> Result<Arc<dyn DriverSession>, DriverError> {
        let mode = match config.access_mode {
            AccessMode::Read => "READ",
            AccessMode::Write => "WRITE",
        };
        self.state
            .record(format!("open_session {} {mode}", config.database));
        Ok(Arc::new(MockSession {
            state: self.state.clone(),
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state.record(format!("driver_close {}", self.uri));
        MockState::take(&self.state.driver_close_error)
    }
}

struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl DriverSession for MockSession {
    async fn run(&self, cypher: &str, params: &Params) -> Result<ResultSet, DriverError> {
        self.state.record(format!("run {cypher}"));
        self.state.next_run(params)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn DriverTransaction>, DriverError> {
        MockState::take(&self.state.begin_error)?;
        self.state.record("begin");
        Ok(Box::new(MockTransaction {
            state: self.state.clone(),
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state.record("session_close");
        MockState::take(&self.state.session_close_error)
    }
}

struct MockTransaction {
    state: Arc<MockState>,
}

#[async_trait]
impl DriverTransaction for MockTransaction {
    async fn run(&mut self, cypher: &str, params: &Params) -> Result<ResultSet, DriverError> {
        self.state.record(format!("tx_run {cypher}"));
        self.state.next_run(params)
    }

    async fn commit(self: Box<Self>) -> Result<(), DriverError> {
        self.state.record("commit");
        MockState::take(&self.state.commit_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DriverError> {
        self.state.record("rollback");
        MockState::take(&self.state.rollback_error)
    }
}

/// Valid parameters for a connection named `alias`.
pub fn params(alias: &str) -> ConnectionParams {
    ConnectionParams::new(alias, "neo4j://localhost:7687", "neo4j", "neo4j", "secret")
}
