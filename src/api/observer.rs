// src/api/observer.rs
//! Hooks for watching the traffic of a site.

use super::responses::ApiResult;
use crate::constants::QUERY_LOG_CAPACITY;
use crate::types::Params;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Receives every parameter set sent and every result accepted.
///
/// `on_query` fires once per HTTP attempt, retries included; `on_result`
/// fires once per successful response.
pub trait RequestObserver: Send + Sync {
    fn on_query(&self, _params: &Params) {}
    fn on_result(&self, _result: &ApiResult) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}

/// Bounded in-memory record of recent queries and results, newest first.
#[derive(Debug)]
pub struct QueryLog {
    capacity: usize,
    queries: Mutex<VecDeque<Params>>,
    results: Mutex<VecDeque<ApiResult>>,
}

impl QueryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queries: Mutex::new(VecDeque::new()),
            results: Mutex::new(VecDeque::new()),
        }
    }

    pub fn queries(&self) -> Vec<Params> {
        self.queries.lock().iter().cloned().collect()
    }

    pub fn results(&self) -> Vec<ApiResult> {
        self.results.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.queries.lock().clear();
        self.results.lock().clear();
    }

    fn push_front<T>(&self, queue: &Mutex<VecDeque<T>>, item: T) {
        let mut queue = queue.lock();
        queue.push_front(item);
        queue.truncate(self.capacity);
    }
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(QUERY_LOG_CAPACITY)
    }
}

impl RequestObserver for QueryLog {
    fn on_query(&self, params: &Params) {
        self.push_front(&self.queries, params.clone());
    }

    fn on_result(&self, result: &ApiResult) {
        self.push_front(&self.results, result.clone());
    }
}
