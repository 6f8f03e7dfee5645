// src/api/mod.rs
//! MediaWiki action API interaction.
//!
//! Layered bottom-up: [`client`] moves bytes over HTTP, [`responses`]
//! classifies what came back, [`request`] decides whether to retry, and
//! [`continuation`] and [`listing`] follow the server's pagination on top of
//! single requests. Nothing above `client` knows about HTTP details.

pub mod client;
pub mod combine;
pub mod continuation;
pub mod listing;
pub mod observer;
pub mod request;
pub mod responses;

pub use client::{HttpCall, HttpMethod, HttpTransport, RawResponse, ReqwestTransport};
pub use combine::combine;
pub use continuation::{
    is_generator_key, pick_continuation_key, ContinuationChoice, LegacyContinuation,
    ModernContinuation, QueryPages,
};
pub use listing::{ListEntries, ListLimit, ListQuery, ModuleKind};
pub use observer::{NoopObserver, QueryLog, RequestObserver};
pub use request::Request;
pub use responses::{ApiPayload, ApiResult};
