// src/api/listing.rs
//! Bounded list queries over a single `list=` or `prop=` module.
//!
//! Built on the modern continuation protocol: every request carries
//! `continue=` and the server's `continue` block is echoed back verbatim.

use super::request::Request;
use super::responses::ApiResult;
use crate::error::{Result, WikiError};
use crate::site::Site;
use crate::types::{Direction, ParamValue, Params};
use serde_json::Value;
use std::collections::VecDeque;
use std::iter::FusedIterator;

/// Which query parameter the module is selected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// `list=<module>`; items live at `query.<module>`
    List,
    /// `prop=<module>`; items live under the first page in `query.pages`
    Prop,
}

impl ModuleKind {
    fn param_name(self) -> &'static str {
        match self {
            ModuleKind::List => "list",
            ModuleKind::Prop => "prop",
        }
    }
}

/// How many items to gather at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListLimit {
    #[default]
    All,
    Max(usize),
}

impl ListLimit {
    fn remaining(self, gathered: usize) -> Option<usize> {
        match self {
            ListLimit::All => None,
            ListLimit::Max(max) => Some(max.saturating_sub(gathered)),
        }
    }
}

/// A query for the items of one module, e.g. `list=logevents` with prefix
/// `le`.
///
/// ```no_run
/// # fn demo(site: &wikiq::Site) -> wikiq::Result<()> {
/// use wikiq::{ListLimit, ListQuery};
///
/// let events = ListQuery::list("logevents", "le")
///     .limit(ListLimit::Max(50))
///     .param("letype", "block")
///     .collect(site)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ListQuery {
    kind: ModuleKind,
    module: String,
    prefix: String,
    direction: Direction,
    limit: ListLimit,
    low_limit: bool,
    extra: Params,
}

impl ListQuery {
    pub fn new(kind: ModuleKind, module: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            kind,
            module: module.into(),
            prefix: prefix.into(),
            direction: Direction::default(),
            limit: ListLimit::default(),
            low_limit: false,
            extra: Params::new(),
        }
    }

    pub fn list(module: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(ModuleKind::List, module, prefix)
    }

    pub fn prop(module: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(ModuleKind::Prop, module, prefix)
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: ListLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Caps each batch at a tenth of the site limit, for modules the server
    /// treats as expensive.
    pub fn low_limit(mut self, low_limit: bool) -> Self {
        self.low_limit = low_limit;
        self
    }

    /// Adds an extra module parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.extra.insert(name, value);
        self
    }

    fn batch_cap(&self, site: &Site) -> usize {
        let cap = site.limit() as usize;
        if self.low_limit {
            (cap / 10).max(1)
        } else {
            cap.max(1)
        }
    }

    fn batch_size(&self, site: &Site, gathered: usize) -> usize {
        let cap = self.batch_cap(site);
        match self.limit.remaining(gathered) {
            Some(remaining) => remaining.min(cap),
            None => cap,
        }
    }

    fn batch_params(&self, batch: usize, next: Option<&Params>) -> Params {
        let base = Params::new()
            .with("action", "query")
            .with(self.kind.param_name(), self.module.as_str())
            .with(format!("{}dir", self.prefix), self.direction.as_str())
            .with(format!("{}limit", self.prefix), batch as i64)
            .with("continue", "")
            .overlay(&self.extra);
        match next {
            Some(next) => base.overlay(next),
            None => base,
        }
    }

    fn fetch_batch(
        &self,
        site: &Site,
        batch: usize,
        next: Option<&Params>,
    ) -> Result<(Vec<Value>, Option<Params>)> {
        let response = Request::new(site, self.batch_params(batch, next)).send()?;
        let items = self.items(&response)?;
        let next = response
            .get("continue")
            .and_then(Value::as_object)
            .map(|block| {
                block
                    .iter()
                    .map(|(key, value)| (key.clone(), ParamValue::from_json(value)))
                    .collect()
            });
        Ok((items, next))
    }

    fn items(&self, response: &ApiResult) -> Result<Vec<Value>> {
        let query = response
            .query()
            .ok_or_else(|| WikiError::MalformedResponse("list response has no query".into()))?;

        let items = match self.kind {
            ModuleKind::List => query.get(&self.module),
            ModuleKind::Prop => query
                .get("pages")
                .and_then(Value::as_object)
                .and_then(|pages| pages.values().next())
                .and_then(|page| page.get(&self.module)),
        };

        match items {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(WikiError::MalformedResponse(format!(
                "{} is not a list",
                self.module
            ))),
            None if self.kind == ModuleKind::Prop => Ok(Vec::new()),
            None => Err(WikiError::MalformedResponse(format!(
                "query has no {}",
                self.module
            ))),
        }
    }

    /// Gathers items until the limit is reached or the server has no more.
    ///
    /// Without the `continue` feature only the first batch is returned.
    pub fn collect(&self, site: &Site) -> Result<Vec<Value>> {
        if !site.supports_continue() {
            log::warn!(
                "Only {} {} entries will be returned",
                self.batch_size(site, 0),
                self.module
            );
        }

        let mut entries = Vec::new();
        let mut next: Option<Params> = None;
        loop {
            let batch = self.batch_size(site, entries.len());
            if batch == 0 {
                break;
            }
            let (items, continuation) = self.fetch_batch(site, batch, next.as_ref())?;
            entries.extend(items);
            next = continuation;
            if next.is_none() {
                break;
            }
        }

        if let Some(max) = self.limit.remaining(0) {
            entries.truncate(max);
        }
        Ok(entries)
    }

    /// Yields items one at a time, fetching a batch only when the previous
    /// one is used up.
    pub fn entries<'s>(&self, site: &'s Site) -> Result<ListEntries<'s>> {
        if !site.supports_continue() {
            return Err(WikiError::Unsupported(
                "MediaWiki 1.21+ is required for this function".to_string(),
            ));
        }
        Ok(ListEntries {
            site,
            query: self.clone(),
            buffer: VecDeque::new(),
            next: None,
            yielded: 0,
            exhausted: false,
        })
    }
}

/// Lazy iterator over the items of a [`ListQuery`].
#[derive(Debug)]
pub struct ListEntries<'s> {
    site: &'s Site,
    query: ListQuery,
    buffer: VecDeque<Value>,
    next: Option<Params>,
    yielded: usize,
    exhausted: bool,
}

impl ListEntries<'_> {
    fn refill(&mut self) -> Result<()> {
        let batch = self.query.batch_size(self.site, self.yielded);
        if batch == 0 {
            self.exhausted = true;
            return Ok(());
        }
        let (items, next) = self
            .query
            .fetch_batch(self.site, batch, self.next.as_ref())?;
        self.buffer.extend(items);
        self.exhausted = next.is_none();
        self.next = next;
        Ok(())
    }
}

impl Iterator for ListEntries<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.query.limit.remaining(self.yielded) == Some(0) {
                return None;
            }
            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

impl FusedIterator for ListEntries<'_> {}
