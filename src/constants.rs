// src/constants.rs
//! Domain constants that define the operational boundaries of the client.
//!
//! Each constant is named for the wiki concept it constrains. Reading these
//! tells you how patient the client is with a struggling server and how much
//! it asks for per round-trip.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Rate limiting and retry budget
// ---------------------------------------------------------------------------

/// Replication lag, in seconds, the client tolerates by default.
///
/// Sent as the `maxlag` parameter. The server refuses requests while its
/// lag exceeds this value and the client waits instead.
pub const DEFAULT_MAXLAG: i64 = 5;

/// Ceiling on `maxlag` for housekeeping queries (site info, tokens, user info).
pub const HOUSEKEEPING_MAXLAG: i64 = 120;

/// Total time the client is willing to spend waiting on one request.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// First backoff delay after a transient failure.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Linear growth of the backoff delay between consecutive transient failures.
pub const BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Added to every sleep so the client never wakes up a hair too early.
pub const SLEEP_PADDING: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Result sizes
// ---------------------------------------------------------------------------

/// Items per request for ordinary accounts.
pub const DEFAULT_QUERY_LIMIT: u32 = 500;

/// Items per request for accounts holding `apihighlimits`.
pub const HIGH_QUERY_LIMIT: u32 = 5000;

/// Legacy continuation parameters shorter than this are treated as
/// non-generator keys when choosing which module to continue.
pub const SHORT_CONTINUE_KEY_LEN: usize = 11;

// ---------------------------------------------------------------------------
// Wire protocol
// ---------------------------------------------------------------------------

/// The only output format this client understands.
pub const OUTPUT_FORMAT: &str = "json";

/// Text served by `api.php` when the API has been switched off.
pub const API_DISABLED_SIGNATURE: &str = "MediaWiki API is not enabled for this site.";

/// Separator for multi-valued parameters.
pub const MULTI_VALUE_SEPARATOR: &str = "|";

/// Default `User-Agent` header.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default HTTP timeout for a single round-trip.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing unparseable response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

/// Entries retained by a [`crate::QueryLog`] unless configured otherwise.
pub const QUERY_LOG_CAPACITY: usize = 100;
