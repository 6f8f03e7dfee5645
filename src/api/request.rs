// src/api/request.rs
//! One API call and its retry policy.
//!
//! `send` is the transport/retry layer: it performs the HTTP round-trip,
//! classifies the answer and decides between returning, sleeping and trying
//! again, or failing. It never looks at continuation markers.

use super::client::{HttpCall, HttpMethod, RawResponse};
use super::responses::{ApiResult, Reply};
use crate::constants::{
    API_DISABLED_SIGNATURE, ERROR_BODY_PREVIEW_LENGTH, INITIAL_BACKOFF, OUTPUT_FORMAT,
    SLEEP_PADDING,
};
use crate::error::{Result, TransportError, WikiError};
use crate::error_recovery::Backoff;
use crate::site::Site;
use crate::types::{ParamValue, Params};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static LAG_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) seconds").expect("lag pattern is valid"));

/// A request to the site's API.
///
/// `format` is always `json`. `maxlag` comes from the site unless the caller
/// set one or the site disabled it. Write requests are never retried after a
/// transport failure or an API error; only maxlag waits apply to them.
#[derive(Debug)]
pub struct Request<'s> {
    site: &'s Site,
    params: Params,
    write: bool,
    backoff: Backoff,
}

impl<'s> Request<'s> {
    /// A read request.
    pub fn new(site: &'s Site, params: Params) -> Self {
        Self::build(site, params, false)
    }

    /// A mutating request.
    pub fn write(site: &'s Site, params: Params) -> Self {
        Self::build(site, params, true)
    }

    fn build(site: &'s Site, params: Params, write: bool) -> Self {
        Self {
            site,
            params: Self::normalize(site, params, write),
            write,
            backoff: Backoff::new(),
        }
    }

    fn normalize(site: &Site, mut params: Params, write: bool) -> Params {
        params.insert("format", OUTPUT_FORMAT);
        if write {
            if let Some(assertion) = site.assertion() {
                params.insert("assert", assertion.as_str());
            }
        }
        if !params.contains("maxlag") && site.maxlag() >= 0 {
            params.insert("maxlag", site.maxlag());
        }
        params
    }

    pub fn site(&self) -> &'s Site {
        self.site
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_write(&self) -> bool {
        self.write
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Changes, adds or (with `None`) removes a parameter.
    pub fn change_param(&mut self, name: &str, value: Option<ParamValue>) -> Result<()> {
        if name == "format" {
            return Err(WikiError::FormatLocked);
        }
        match value {
            Some(value) => {
                self.params.insert(name, value);
            }
            None => {
                self.params.remove(name);
            }
        }
        Ok(())
    }

    /// A sibling request on the same site with a different parameter set.
    pub(crate) fn derive(&self, params: Params) -> Request<'s> {
        Self::build(self.site, params, self.write)
    }

    /// Swaps in the parameters for the next round, keeping the retry state.
    pub(crate) fn replace_params(&mut self, params: Params) {
        self.params = Self::normalize(self.site, params, self.write);
    }

    fn method(&self) -> HttpMethod {
        if !self.write && self.site.prefers_get() && !self.params.has_files() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        }
    }

    fn transmit(&self) -> Result<RawResponse, TransportError> {
        self.site.observer().on_query(&self.params);

        let (fields, files) = self.params.split_files();
        let call = HttpCall {
            method: self.method(),
            url: self.site.api_url(),
            fields: &fields,
            files: &files,
            user_agent: self.site.user_agent(),
            credentials: self.site.credentials(),
        };

        let response = self.site.transport().execute(&call)?;
        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                url: self.site.api_url().to_string(),
            });
        }
        Ok(response)
    }

    /// Performs the call, retrying transient failures within the site's
    /// wait budget.
    pub fn send(&mut self) -> Result<ApiResult> {
        loop {
            let response = match self.transmit() {
                Ok(response) => response,
                Err(e) => {
                    if self.pause_before_retry(&e.to_string()) {
                        continue;
                    }
                    return Err(WikiError::Server(e));
                }
            };

            let RawResponse { body, headers, .. } = response;
            match Reply::classify(&body, headers) {
                Reply::Success(result) => {
                    self.backoff.reset();
                    self.site.observer().on_result(&result);
                    return Ok(result);
                }
                Reply::ApiError { code, info } if code.is_lag() => {
                    self.wait_for_lag(&info);
                }
                Reply::ApiError { code, info } => {
                    if self.write && code.is_blocked() {
                        return Err(WikiError::UserBlocked(info));
                    }
                    return Err(WikiError::ApiQuery {
                        code,
                        message: info,
                    });
                }
                Reply::Unrecognized => {
                    if body.contains(API_DISABLED_SIGNATURE) {
                        return Err(WikiError::ApiDisabled);
                    }
                    if self.pause_before_retry("Invalid JSON") {
                        continue;
                    }
                    return Err(WikiError::ApiFailure {
                        preview: body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect(),
                    });
                }
            }
        }
    }

    /// Sleeps before the next attempt if retrying is allowed and the budget
    /// is not spent.
    fn pause_before_retry(&mut self, reason: &str) -> bool {
        if self.write {
            return false;
        }
        match self.backoff.next_wait(self.site.max_wait()) {
            Some(wait) => {
                log::warn!(
                    "{}: trying request again in {} seconds",
                    reason,
                    wait.as_secs()
                );
                self.site.sleeper().sleep(wait + SLEEP_PADDING);
                true
            }
            None => false,
        }
    }

    fn wait_for_lag(&self, info: &str) {
        let lag = parse_lag_seconds(info)
            .map(Duration::from_secs)
            .unwrap_or(INITIAL_BACKOFF)
            .min(self.site.max_wait());
        log::warn!("Server lag, sleeping for {} seconds", lag.as_secs());
        self.site.sleeper().sleep(lag + SLEEP_PADDING);
    }
}

/// Reads the reported lag from a maxlag error message.
///
/// Lags too large for `u64` saturate so the wait budget still caps them.
fn parse_lag_seconds(info: &str) -> Option<u64> {
    LAG_SECONDS
        .captures(info)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
}
