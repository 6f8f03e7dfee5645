// src/lib.rs
//! wikiq library: a blocking client for the MediaWiki action API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Site**: `Site`, `SiteConfig`, feature names
//! - **Requests**: `Request` with `send`, `query_all` and `query_pages`
//! - **Results**: `ApiResult`, `ApiPayload`, `combine`
//! - **Listing**: `ListQuery`, `ListLimit`, `ModuleKind`
//! - **Parameters**: `Params`, `ParamValue`, `FilePayload`, `Namespace`
//! - **Error handling**: `WikiError`, `ApiErrorCode`, `TransportError`
//! - **Seams**: `HttpTransport`, `Sleeper`, `RequestObserver`

pub mod api;
pub mod config;
pub mod constants;
mod error;
mod error_recovery;
mod site;
mod types;

// --- Error Handling ---
pub use crate::error::{ApiErrorCode, Result, TransportError, WikiError};

// --- Configuration ---
pub use crate::config::SiteConfig;

// --- Site ---
pub use crate::site::{
    NamespaceInfo, Site, FEATURE_ASSERT_EDIT, FEATURE_CONTINUE, FEATURE_NEW_TOKEN,
};

// --- Requests and Results ---
pub use crate::api::{
    combine, is_generator_key, pick_continuation_key, ApiPayload, ApiResult, ContinuationChoice,
    LegacyContinuation, ListEntries, ListLimit, ListQuery, ModernContinuation, ModuleKind,
    QueryPages, Request,
};

// --- Domain Types ---
pub use crate::types::{
    Assertion, Credentials, Direction, FilePayload, Namespace, NamespaceList, ParamValue, Params,
};

// --- Seams ---
pub use crate::api::{
    HttpCall, HttpMethod, HttpTransport, NoopObserver, QueryLog, RawResponse, ReqwestTransport,
    RequestObserver,
};
pub use crate::error_recovery::{Backoff, Sleeper, ThreadSleeper};
