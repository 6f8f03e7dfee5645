// src/config.rs
use crate::constants::{
    DEFAULT_HTTP_TIMEOUT, DEFAULT_MAXLAG, DEFAULT_MAX_WAIT, DEFAULT_QUERY_LIMIT, USER_AGENT,
};
use crate::error::WikiError;
use crate::types::{Credentials, Params};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Everything needed to construct a [`crate::Site`].
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub api_url: String,
    pub credentials: Option<Credentials>,
    /// Negative disables the `maxlag` parameter entirely.
    pub maxlag: i64,
    pub max_wait: Duration,
    pub limit: u32,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    /// Send read requests as GET instead of POST.
    pub prefer_get: bool,
}

impl SiteConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn credentials(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials::new(user, password)),
            ..self
        }
    }

    pub fn maxlag(self, maxlag: i64) -> Self {
        Self { maxlag, ..self }
    }

    pub fn max_wait(self, max_wait: Duration) -> Self {
        Self { max_wait, ..self }
    }

    pub fn limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..self
        }
    }

    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    pub fn prefer_get(self, prefer_get: bool) -> Self {
        Self { prefer_get, ..self }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            credentials: None,
            maxlag: DEFAULT_MAXLAG,
            max_wait: DEFAULT_MAX_WAIT,
            limit: DEFAULT_QUERY_LIMIT,
            user_agent: USER_AGENT.to_string(),
            timeout: Some(DEFAULT_HTTP_TIMEOUT),
            prefer_get: false,
        }
    }
}

/// How the binary drives a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryMode {
    /// One round-trip, no continuation
    Send,
    /// Follow legacy `query-continue` markers and merge everything
    All,
    /// Follow `continue` tokens and print one result per page
    Pages,
}

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// API parameters as key=value pairs (e.g. action=query list=allpages)
    #[arg(required = true)]
    pub params: Vec<String>,

    /// URL of the wiki's api.php
    #[arg(short, long, default_value = "https://en.wikipedia.org/w/api.php")]
    pub api: String,

    /// How to follow continuation
    #[arg(short, long, value_enum, default_value_t = QueryMode::Send)]
    pub mode: QueryMode,

    /// Maximum acceptable replication lag in seconds (negative disables)
    #[arg(long, default_value_t = DEFAULT_MAXLAG, allow_negative_numbers = true)]
    pub maxlag: i64,

    /// Maximum total seconds to spend waiting on retries
    #[arg(long, default_value_t = DEFAULT_MAX_WAIT.as_secs())]
    pub max_wait: u64,

    /// Mark the request as mutating (disables automatic retries)
    #[arg(short, long, default_value_t = false)]
    pub write: bool,

    /// Send reads as GET requests
    #[arg(long, default_value_t = false)]
    pub get: bool,

    /// HTTP Basic auth user; the password is read from WIKIQ_HTTP_PASSWORD
    #[arg(long)]
    pub http_user: Option<String>,

    /// Override the User-Agent header
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Skip the site-info query on startup
    #[arg(long, default_value_t = false)]
    pub no_siteinfo: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved run configuration for the binary.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub site: SiteConfig,
    pub params: Params,
    pub mode: QueryMode,
    pub write: bool,
    pub load_siteinfo: bool,
    pub verbose: bool,
}

impl RunConfig {
    /// Resolves a run configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, WikiError> {
        let params = parse_param_pairs(&cli.params)?;

        let mut site = SiteConfig::new(cli.api)
            .maxlag(cli.maxlag)
            .max_wait(Duration::from_secs(cli.max_wait))
            .prefer_get(cli.get);

        if let Some(user_agent) = cli.user_agent {
            site = site.user_agent(user_agent);
        }

        if let Some(user) = cli.http_user {
            let password = std::env::var("WIKIQ_HTTP_PASSWORD").map_err(|_| {
                WikiError::Configuration(
                    "WIKIQ_HTTP_PASSWORD environment variable not set".to_string(),
                )
            })?;
            site = site.credentials(user, password);
        }

        Ok(RunConfig {
            site,
            params,
            mode: cli.mode,
            write: cli.write,
            load_siteinfo: !cli.no_siteinfo,
            verbose: cli.verbose,
        })
    }
}

/// Parses `key=value` pairs; the value may itself contain `=`.
pub fn parse_param_pairs(pairs: &[String]) -> Result<Params, WikiError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    WikiError::InvalidValue(format!("Expected key=value, got '{}'", pair))
                })
        })
        .collect()
}
