// src/api/continuation.rs
//! Query continuation: following the server's pagination tokens.
//!
//! Two protocols exist. The legacy one returns a nested `query-continue`
//! object (module -> parameter -> token) and is followed by
//! [`Request::query_all`], which stitches every page into one result. The
//! modern one returns a flat `continue` object that is echoed back verbatim
//! and is followed by [`Request::query_pages`], which hands out one page at a
//! time. The two are never mixed within one sequence.

use super::combine::combine;
use super::request::Request;
use super::responses::ApiResult;
use crate::constants::SHORT_CONTINUE_KEY_LEN;
use crate::error::{Result, WikiError};
use crate::site::FEATURE_CONTINUE;
use crate::types::{ParamValue, Params};
use serde_json::{Map, Value};
use std::iter::FusedIterator;

// ---------------------------------------------------------------------------
// Legacy protocol
// ---------------------------------------------------------------------------

/// A non-empty `query-continue` block.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyContinuation(Map<String, Value>);

impl LegacyContinuation {
    pub fn from_result(result: &ApiResult) -> Option<Self> {
        result
            .get("query-continue")
            .and_then(Value::as_object)
            .filter(|modules| !modules.is_empty())
            .map(|modules| Self(modules.clone()))
    }

    /// Continuable modules in server order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Continuation parameters of one module in server order.
    pub fn keys(&self, module: &str) -> Vec<&str> {
        self.0
            .get(module)
            .and_then(Value::as_object)
            .map(|keys| keys.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn token(&self, module: &str, key: &str) -> Option<&Value> {
        self.0.get(module).and_then(|keys| keys.get(key))
    }
}

/// The one continuation parameter applied in a round.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationChoice {
    pub module: String,
    pub key: String,
    pub token: ParamValue,
}

fn is_short_key(key: &str) -> bool {
    key.len() < SHORT_CONTINUE_KEY_LEN
}

/// Whether a legacy continuation parameter continues a generator.
///
/// Generator keys (`gapcontinue`, `gcmcontinue`, ...) are long and prefixed
/// with `g`; they must survive across rounds while property keys change.
pub fn is_generator_key(key: &str) -> bool {
    !is_short_key(key) && key.starts_with('g')
}

/// Picks the single parameter to continue with this round.
///
/// The server makes no promise about stale parameters for a module it has
/// finished, so only one parameter is ever applied per round. Short keys are
/// preferred because generator keys are long; this is a heuristic, not a
/// server contract, and all of it lives here so it can be swapped out.
pub fn pick_continuation_key(marker: &LegacyContinuation) -> Option<ContinuationChoice> {
    let modules: Vec<&str> = marker.modules().collect();

    let (module, key) = match modules.as_slice() {
        [] => return None,
        [only] => {
            let keys = marker.keys(only);
            let key = match keys.as_slice() {
                [single] => *single,
                many => many
                    .iter()
                    .copied()
                    .find(|key| is_short_key(key))
                    .or_else(|| many.first().copied())?,
            };
            (*only, key)
        }
        many => many
            .iter()
            .find_map(|module| {
                marker
                    .keys(module)
                    .into_iter()
                    .find(|key| is_short_key(key))
                    .map(|key| (*module, key))
            })
            .or_else(|| {
                let first = many.first()?;
                marker.keys(first).first().map(|key| (*first, *key))
            })?,
    };

    let token = marker.token(module, key).map(ParamValue::from_json)?;
    Some(ContinuationChoice {
        module: module.to_string(),
        key: key.to_string(),
        token,
    })
}

/// Continuation parameters accumulated over the rounds of one sequence.
///
/// A new generator key replaces the generator slot and discards the property
/// keys collected for the previous batch of generated pages.
#[derive(Debug, Clone, Default, PartialEq)]
struct ContinuationOverlay {
    generator: Option<(String, ParamValue)>,
    props: Params,
}

impl ContinuationOverlay {
    fn advance(self, choice: ContinuationChoice) -> Self {
        if is_generator_key(&choice.key) {
            Self {
                generator: Some((choice.key, choice.token)),
                props: Params::new(),
            }
        } else {
            let mut props = self.props;
            props.insert(choice.key, choice.token);
            Self {
                generator: self.generator,
                props,
            }
        }
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some((key, token)) = &self.generator {
            params.insert(key.clone(), token.clone());
        }
        params.overlay(&self.props)
    }
}

// ---------------------------------------------------------------------------
// Modern protocol
// ---------------------------------------------------------------------------

/// The flat `continue` block, echoed back as-is on the next request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModernContinuation(Params);

impl ModernContinuation {
    pub fn from_result(result: &ApiResult) -> Option<Self> {
        result
            .get("continue")
            .and_then(Value::as_object)
            .map(|block| {
                Self(
                    block
                        .iter()
                        .map(|(key, token)| (key.clone(), ParamValue::from_json(token)))
                        .collect(),
                )
            })
    }

    pub fn params(&self) -> &Params {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

impl<'s> Request<'s> {
    /// Sends the request and follows legacy `query-continue` markers until
    /// the server reports none, merging every page into one result.
    ///
    /// A result without markers is returned untouched. New code should prefer
    /// [`Request::query_pages`], which keeps only one page in memory.
    pub fn query_all(&mut self) -> Result<ApiResult> {
        let first = self.send()?;
        match LegacyContinuation::from_result(&first) {
            Some(marker) => self.merge_continued(first, marker),
            None => Ok(first),
        }
    }

    fn merge_continued(&self, first: ApiResult, marker: LegacyContinuation) -> Result<ApiResult> {
        let base = self.params().clone();
        let mut total = first;
        let mut overlay = ContinuationOverlay::default();
        let mut marker = Some(marker);

        while let Some(current) = marker.take() {
            let Some(choice) = pick_continuation_key(&current) else {
                break;
            };
            log::debug!(
                "Continuing {} with {}={:?}",
                choice.module,
                choice.key,
                choice.token
            );

            overlay = overlay.advance(choice);
            let page = self.derive(base.overlay(&overlay.to_params())).send()?;

            for module in current.modules() {
                total = combine(module, total, &page)?;
            }
            marker = LegacyContinuation::from_result(&page);
        }

        Ok(total)
    }

    /// Turns the request into a lazy sequence of result pages.
    ///
    /// Fails at once if the site lacks the `continue` protocol. Each call to
    /// `next` performs exactly one round-trip; the parameters for the
    /// following page are prepared but not sent until asked for.
    pub fn query_pages(self) -> Result<QueryPages<'s>> {
        if !self.site().supports_continue() {
            return Err(WikiError::Unsupported(
                "MediaWiki 1.21+ is required for this function".to_string(),
            ));
        }
        let base = self.params().clone();
        let first = base.clone().with(FEATURE_CONTINUE, "");
        Ok(QueryPages {
            request: self,
            base,
            pending: Some(first),
        })
    }
}

/// Lazy, finite, non-restartable sequence of result pages.
///
/// Ends after the first page without a `continue` block, or right after
/// yielding an error.
#[derive(Debug)]
pub struct QueryPages<'s> {
    request: Request<'s>,
    base: Params,
    pending: Option<Params>,
}

impl QueryPages<'_> {
    /// Whether another page will be requested on the next call.
    pub fn has_more(&self) -> bool {
        self.pending.is_some()
    }
}

impl Iterator for QueryPages<'_> {
    type Item = Result<ApiResult>;

    fn next(&mut self) -> Option<Self::Item> {
        let params = self.pending.take()?;
        self.request.replace_params(params);

        match self.request.send() {
            Ok(page) => {
                self.pending = ModernContinuation::from_result(&page)
                    .map(|next| self.base.overlay(next.params()));
                Some(Ok(page))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for QueryPages<'_> {}
