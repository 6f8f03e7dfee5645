// src/site.rs
//! One remote wiki: where its API lives, how patient to be with it, and what
//! it supports.

use crate::api::client::{HttpTransport, ReqwestTransport};
use crate::api::observer::{NoopObserver, RequestObserver};
use crate::api::Request;
use crate::config::SiteConfig;
use crate::constants::{HIGH_QUERY_LIMIT, HOUSEKEEPING_MAXLAG};
use crate::error::{Result, WikiError};
use crate::error_recovery::{Sleeper, ThreadSleeper};
use crate::types::{Assertion, Credentials, Namespace, Params};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Set when the wiki understands the flat `continue` protocol (MediaWiki 1.21+).
pub const FEATURE_CONTINUE: &str = "continue";
/// Set when `assert=` is honoured on writes (MediaWiki 1.23+).
pub const FEATURE_ASSERT_EDIT: &str = "AssertEdit";
/// Set when tokens come from `meta=tokens`.
pub const FEATURE_NEW_TOKEN: &str = "newtoken";

static GENERATOR_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\.(\d\d)").expect("generator version pattern is valid"));

/// Token kinds available through the pre-1.24 `intoken` mechanism.
const LEGACY_TOKEN_KINDS: [&str; 8] = [
    "edit", "delete", "protect", "move", "block", "unblock", "email", "csrf",
];

/// One namespace as described by `siprop=namespaces`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceInfo {
    pub id: Namespace,
    /// Local name; empty for the main namespace
    #[serde(rename = "*", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub canonical: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamespaceAlias {
    id: Namespace,
    #[serde(rename = "*", alias = "alias")]
    alias: String,
}

/// A remote wiki.
///
/// Long-lived and shared by every request made against it. Requests only
/// borrow it immutably; configuration changes take `&mut self` and therefore
/// cannot race an in-flight request.
pub struct Site {
    api_url: Url,
    domain: String,
    credentials: Option<Credentials>,
    maxlag: i64,
    max_wait: Duration,
    limit: u32,
    user_agent: String,
    prefer_get: bool,
    assertion: Option<Assertion>,
    features: BTreeSet<String>,
    siteinfo: Map<String, Value>,
    namespaces: BTreeMap<Namespace, NamespaceInfo>,
    namespace_aliases: BTreeMap<String, Namespace>,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn RequestObserver>,
}

impl Site {
    /// Builds a site backed by a real HTTP client without contacting it.
    pub fn new(config: SiteConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Builds a site and loads its site info.
    ///
    /// Read-restricted wikis refuse the site-info query before login; such
    /// API-level refusals are logged and the site is returned without
    /// detected features. Server errors still fail.
    pub fn open(config: SiteConfig) -> Result<Self> {
        let mut site = Self::new(config)?;
        if let Err(e) = site.load_siteinfo().map(|_| ()) {
            match e {
                WikiError::ApiQuery { .. }
                | WikiError::ApiDisabled
                | WikiError::ApiFailure { .. }
                | WikiError::MalformedResponse(_) => {
                    log::warn!("Could not load site info for {}: {}", site.domain, e);
                }
                other => return Err(other),
            }
        }
        Ok(site)
    }

    /// Builds a site on top of any transport.
    pub fn with_transport(config: SiteConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)?;
        let domain = format!(
            "{}://{}",
            api_url.scheme(),
            api_url.host_str().unwrap_or_default()
        );

        Ok(Site {
            api_url,
            domain,
            credentials: config.credentials,
            maxlag: config.maxlag,
            max_wait: config.max_wait,
            limit: config.limit,
            user_agent: config.user_agent,
            prefer_get: config.prefer_get,
            assertion: None,
            features: BTreeSet::new(),
            siteinfo: Map::new(),
            namespaces: BTreeMap::new(),
            namespace_aliases: BTreeMap::new(),
            transport,
            sleeper: Arc::new(ThreadSleeper),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_sleeper(self, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper, ..self }
    }

    pub fn with_observer(self, observer: Arc<dyn RequestObserver>) -> Self {
        Self { observer, ..self }
    }

    // --- Accessors ---

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Scheme and host, e.g. `https://en.wikipedia.org`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn maxlag(&self) -> i64 {
        self.maxlag
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn prefers_get(&self) -> bool {
        self.prefer_get
    }

    pub fn assertion(&self) -> Option<Assertion> {
        self.assertion
    }

    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Whether the flat `continue` protocol is available.
    pub fn supports_continue(&self) -> bool {
        self.has_feature(FEATURE_CONTINUE)
    }

    /// The `general` block of the last site-info query.
    pub fn siteinfo(&self) -> &Map<String, Value> {
        &self.siteinfo
    }

    pub fn namespaces(&self) -> &BTreeMap<Namespace, NamespaceInfo> {
        &self.namespaces
    }

    /// Looks a namespace up by local name, canonical name or alias.
    ///
    /// Comparison ignores case and treats spaces and underscores alike.
    pub fn namespace_named(&self, name: &str) -> Option<Namespace> {
        let wanted = normalize_namespace_name(name);
        self.namespaces
            .values()
            .find(|info| {
                normalize_namespace_name(&info.name) == wanted
                    || info
                        .canonical
                        .as_deref()
                        .is_some_and(|canonical| normalize_namespace_name(canonical) == wanted)
            })
            .map(|info| info.id)
            .or_else(|| {
                self.namespace_aliases
                    .iter()
                    .find(|(alias, _)| normalize_namespace_name(alias) == wanted)
                    .map(|(_, id)| *id)
            })
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub(crate) fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    pub(crate) fn observer(&self) -> &dyn RequestObserver {
        self.observer.as_ref()
    }

    // --- Settings ---

    /// Sets the maximum server lag to allow; negative disables the check.
    pub fn set_maxlag(&mut self, maxlag: i64) -> i64 {
        self.maxlag = maxlag;
        self.maxlag
    }

    pub fn set_max_wait(&mut self, max_wait: Duration) {
        self.max_wait = max_wait;
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &str {
        self.user_agent = user_agent.into();
        &self.user_agent
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    /// Marks a feature as available, for wikis whose site info is unreadable.
    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.insert(feature.into());
    }

    /// Sets the assertion added to write requests; `None` removes it.
    pub fn set_assert(&mut self, assertion: Option<Assertion>) -> Result<Option<Assertion>> {
        if !self.has_feature(FEATURE_ASSERT_EDIT) {
            return Err(WikiError::Unsupported(
                "AssertEdit is not available on this wiki".to_string(),
            ));
        }
        self.assertion = assertion;
        Ok(self.assertion)
    }

    // --- Queries ---

    /// Raises `maxlag` to the housekeeping ceiling for low-priority queries.
    fn housekeeping(&self, mut params: Params) -> Params {
        if (0..HOUSEKEEPING_MAXLAG).contains(&self.maxlag) {
            params.insert("maxlag", HOUSEKEEPING_MAXLAG);
        }
        params
    }

    /// Loads general info, namespaces and extensions, and detects features.
    pub fn load_siteinfo(&mut self) -> Result<&mut Self> {
        let params = self.housekeeping(
            Params::new()
                .with("action", "query")
                .with("meta", vec!["siteinfo", "tokens"])
                .with(
                    "siprop",
                    vec!["general", "namespaces", "namespacealiases", "extensions"],
                ),
        );
        let info = Request::new(self, params).send()?;
        let query = info.query().cloned().ok_or_else(|| {
            WikiError::MalformedResponse("site info response has no query".to_string())
        })?;

        self.siteinfo = query
            .get("general")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        self.namespaces = match query.get("namespaces") {
            Some(namespaces) => {
                BTreeMap::<String, NamespaceInfo>::deserialize(namespaces)
                    .map_err(|e| WikiError::MalformedResponse(format!("namespaces: {}", e)))?
                    .into_values()
                    .map(|info| (info.id, info))
                    .collect()
            }
            None => BTreeMap::new(),
        };

        self.namespace_aliases = match query.get("namespacealiases") {
            Some(aliases) => Vec::<NamespaceAlias>::deserialize(aliases)
                .map_err(|e| WikiError::MalformedResponse(format!("namespacealiases: {}", e)))?
                .into_iter()
                .map(|alias| (alias.alias, alias.id))
                .collect(),
            None => BTreeMap::new(),
        };

        if !self.siteinfo.contains_key("writeapi") {
            log::warn!("Write API not enabled on {}, you will not be able to edit", self.domain);
        }

        self.detect_version_features();

        if query.contains_key("tokens") {
            self.features.insert(FEATURE_NEW_TOKEN.to_string());
        }
        if let Some(extensions) = query.get("extensions").and_then(Value::as_array) {
            for name in extensions
                .iter()
                .filter_map(|ext| ext.get("name").and_then(Value::as_str))
            {
                self.features.insert(name.to_string());
            }
        }

        log::info!(
            "Loaded site info for {}: {} namespaces, {} features",
            self.domain,
            self.namespaces.len(),
            self.features.len()
        );
        Ok(self)
    }

    fn detect_version_features(&mut self) {
        let generator = self
            .siteinfo
            .get("generator")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let Some(minor) = GENERATOR_VERSION
            .captures(generator)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            log::warn!("Could not read the MediaWiki version from '{}'", generator);
            return;
        };

        if minor < 21 {
            log::warn!(
                "Some features are unavailable on older versions of MediaWiki. 1.21 or newer is recommended"
            );
        } else {
            self.features.insert(FEATURE_CONTINUE.to_string());
        }
        if minor >= 23 {
            self.features.insert(FEATURE_ASSERT_EDIT.to_string());
        }
    }

    /// Fetches a token of the given kind (`csrf`, `watch`, `patrol`, ...).
    pub fn token(&self, kind: &str) -> Result<String> {
        if self.has_feature(FEATURE_NEW_TOKEN) {
            let params = Params::new()
                .with("action", "query")
                .with("meta", "tokens")
                .with("type", kind);
            let response = Request::new(self, params).send()?;
            let key = format!("{}token", kind);
            return response
                .query()
                .and_then(|query| query.get("tokens"))
                .and_then(|tokens| tokens.get(&key))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| WikiError::MalformedResponse(format!("no {} in response", key)));
        }

        if !LEGACY_TOKEN_KINDS.contains(&kind) {
            return Err(WikiError::Unsupported(format!(
                "Token type '{}' unavailable",
                kind
            )));
        }
        let params = Params::new()
            .with("action", "query")
            .with("prop", "info")
            .with("intoken", "edit")
            .with("titles", "1");
        let response = Request::new(self, params).send()?;
        response
            .query()
            .and_then(|query| query.get("pages"))
            .and_then(Value::as_object)
            .and_then(|pages| pages.values().next())
            .and_then(|page| page.get("edittoken"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WikiError::MalformedResponse("no edittoken in response".to_string()))
    }

    fn userinfo(&self, with_rights: bool) -> Result<Map<String, Value>> {
        let mut params = Params::new()
            .with("action", "query")
            .with("meta", "userinfo");
        if with_rights {
            params.insert("uiprop", "rights");
        }
        let response = Request::new(self, self.housekeeping(params)).send()?;
        response
            .query()
            .and_then(|query| query.get("userinfo"))
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| WikiError::MalformedResponse("no userinfo in response".to_string()))
    }

    /// Whether the session is logged in, optionally as a specific user.
    pub fn is_logged_in(&self, username: Option<&str>) -> Result<bool> {
        let info = self.userinfo(false)?;
        if info.get("id").and_then(Value::as_i64).unwrap_or(0) == 0 {
            return Ok(false);
        }
        Ok(match username {
            Some(expected) => info.get("name").and_then(Value::as_str) == Some(expected),
            None => true,
        })
    }

    /// Reads the session's rights and raises the query limit for accounts
    /// holding `apihighlimits`.
    pub fn load_user_rights(&mut self) -> Result<Vec<String>> {
        let info = self.userinfo(true)?;
        let rights: Vec<String> = info
            .get("rights")
            .and_then(Value::as_array)
            .map(|rights| {
                rights
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if rights.iter().any(|right| right == "apihighlimits") {
            self.limit = HIGH_QUERY_LIMIT;
        }
        Ok(rights)
    }
}

fn normalize_namespace_name(name: &str) -> String {
    name.replace('_', " ").trim().to_lowercase()
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("api_url", &self.api_url.as_str())
            .field("credentials", &self.credentials)
            .field("maxlag", &self.maxlag)
            .field("max_wait", &self.max_wait)
            .field("limit", &self.limit)
            .field("user_agent", &self.user_agent)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.credentials {
            Some(credentials) => write!(f, "{} - as {}", self.domain, credentials.user()),
            None => write!(f, "{}", self.domain),
        }
    }
}
