// tests/common/mod.rs
//! Shared doubles for driving a `Site` without network or real sleeping.

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use wikiq::{
    HttpCall, HttpMethod, HttpTransport, RawResponse, Site, SiteConfig, Sleeper, TransportError,
};

/// What one HTTP round-trip looked like from the transport's side.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub fields: Vec<(String, String)>,
    pub files: Vec<String>,
}

impl RecordedCall {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Replays queued responses in order, then repeats the fallback forever.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<RawResponse>>,
    fallback: Mutex<Option<RawResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    events: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_body(&self, status: u16, body: impl Into<String>) -> &Self {
        self.queue.lock().push_back(RawResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into(),
        });
        self
    }

    pub fn push_json(&self, value: Value) -> &Self {
        self.push_body(200, value.to_string())
    }

    pub fn push_status(&self, status: u16) -> &Self {
        self.push_body(status, "")
    }

    /// Answers every call not covered by the queue with `status`.
    pub fn always_status(&self, status: u16) -> &Self {
        *self.fallback.lock() = Some(RawResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Adds a marker to the shared event log, interleaved with requests.
    pub fn note(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, call: &HttpCall<'_>) -> Result<RawResponse, TransportError> {
        self.calls.lock().push(RecordedCall {
            method: call.method,
            fields: call.fields.to_vec(),
            files: call.files.iter().map(|(name, _)| name.clone()).collect(),
        });
        self.events.lock().push("request".to_string());

        if let Some(response) = self.queue.lock().pop_front() {
            return Ok(response);
        }
        self.fallback
            .lock()
            .clone()
            .ok_or_else(|| TransportError::Other("no scripted response left".to_string()))
    }
}

/// Records requested sleeps instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

/// A test site wired to the given doubles.
pub fn site_with(
    config: SiteConfig,
    transport: &Arc<ScriptedTransport>,
    sleeper: &Arc<RecordingSleeper>,
) -> Site {
    Site::with_transport(config, transport.clone())
        .expect("test config should be valid")
        .with_sleeper(sleeper.clone())
}

pub fn test_config() -> SiteConfig {
    SiteConfig::new("https://wiki.example.org/w/api.php")
}

pub fn secs(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds)
}
