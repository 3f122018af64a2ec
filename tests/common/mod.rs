//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vibecheck::{BackendError, ModelBackend, ModelResponse, RetryPolicy};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture file under `tests/fixtures` as a string.
pub fn read_fixture(relative: &str) -> String {
    let path = fixtures_dir().join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Policy with the default 0.5s base and 8s cap.
pub fn policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(500), Duration::from_secs(8))
}

/// One scripted backend reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    Empty,
    ServerError,
    Timeout,
}

/// A single recorded round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
}

/// Backend that plays back a fixed script of replies.
///
/// Once the script runs out, the last reply is repeated.
#[derive(Clone)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    last: Arc<Mutex<Option<Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    call_count: Arc<AtomicU32>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<ModelResponse, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system_instruction: system_instruction.to_string(),
        });

        let reply = {
            let mut last = self.last.lock().unwrap();
            match self.replies.lock().unwrap().pop_front() {
                Some(reply) => {
                    *last = Some(reply.clone());
                    reply
                }
                None => last.clone().expect("ScriptedBackend needs at least one reply"),
            }
        };

        match reply {
            Reply::Text(text) => Ok(ModelResponse::text(text)),
            Reply::Empty => Ok(ModelResponse::default()),
            Reply::ServerError => Err(BackendError::ServerError {
                status: 500,
                message: "internal".to_string(),
            }),
            Reply::Timeout => Err(BackendError::Timeout { timeout_ms: 10_000 }),
        }
    }
}
