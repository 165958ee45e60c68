//! Scripted [`Transport`] for tests and offline demos.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{FetchError, FetchResult};
use crate::transport::Transport;

/// What [`StaticTransport`] answers for a URL.
#[derive(Clone, Debug)]
pub enum StaticResponse {
    Bytes(Vec<u8>),
    Status(u16),
    Fail(String),
}

/// In-memory transport answering from a fixed table.
///
/// Every fetch yields to the scheduler once before answering, so callers see
/// a real suspension point, and counts how many times each URL was asked
/// for. Unknown URLs answer 404. With a gate, every fetch also waits for a
/// permit, which lets a test hold a fetch open.
#[derive(Debug, Default)]
pub struct StaticTransport {
    responses: Mutex<HashMap<String, StaticResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    gate: Option<Arc<Semaphore>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `bytes` and a 200.
    pub fn with_bytes(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.respond(url, StaticResponse::Bytes(bytes.into()));
        self
    }

    /// Answer `url` with a non-success status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.respond(url, StaticResponse::Status(status));
        self
    }

    /// Answer `url` with a transport failure.
    pub fn with_failure(self, url: &str, reason: &str) -> Self {
        self.respond(url, StaticResponse::Fail(reason.to_string()));
        self
    }

    /// Make every fetch consume a permit from `gate` before answering.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the answer for `url`.
    pub fn respond(&self, url: &str, response: StaticResponse) {
        if let Ok(mut map) = self.responses.lock() {
            map.insert(url.to_string(), response);
        }
    }

    /// How many times `url` has been fetched.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .map(|m| m.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total fetches across all URLs.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|m| m.values().sum()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(url.to_string()).or_insert(0) += 1;
        }
        tokio::task::yield_now().await;
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| FetchError::Transport("gate closed".into()))?
                .forget();
        }

        let response = self
            .responses
            .lock()
            .map_err(|_| FetchError::Transport("response table poisoned".into()))?
            .get(url)
            .cloned();
        match response {
            Some(StaticResponse::Bytes(bytes)) => Ok(bytes),
            Some(StaticResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(StaticResponse::Fail(reason)) => Err(FetchError::Transport(reason)),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
