// src/api/combine.rs
//! Merging of legacy continuation pages into one result.
//!
//! Only the eager `query_all` mode uses this. List modules (`list=...`)
//! appear directly under `query` and are appended, dropping exact repeats. Property modules
//! (`prop=...`, possibly behind a generator) live under `query.pages`, keyed
//! by page id, and are merged page by page.

use super::responses::ApiResult;
use crate::error::{Result, WikiError};
use serde_json::{Map, Value};

/// Merges `new` into `old` for one continued module.
pub fn combine(field: &str, mut old: ApiResult, new: &ApiResult) -> Result<ApiResult> {
    let Some(new_query) = new.query() else {
        return Ok(old);
    };

    let old_query = old
        .as_object_mut()
        .ok_or_else(|| WikiError::MalformedResponse("cannot merge into a list result".into()))?
        .entry("query")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| WikiError::MalformedResponse("query is not an object".into()))?;

    if let Some(new_list) = new_query.get(field) {
        append_list(old_query, field, new_list)?;
        return Ok(old);
    }

    let Some(new_pages) = new_query.get("pages").and_then(Value::as_object) else {
        return Ok(old);
    };
    let old_pages = old_query
        .entry("pages")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| WikiError::MalformedResponse("query.pages is not an object".into()))?;

    for (page_id, new_page) in new_pages {
        let Some(old_page) = old_pages.get_mut(page_id) else {
            old_pages.insert(page_id.clone(), new_page.clone());
            continue;
        };
        let Some(new_entries) = new_page.get(field) else {
            continue;
        };
        let old_page = old_page.as_object_mut().ok_or_else(|| {
            WikiError::MalformedResponse(format!("query.pages.{} is not an object", page_id))
        })?;
        match old_page.get_mut(field) {
            None => {
                old_page.insert(field.to_string(), new_entries.clone());
            }
            Some(Value::Array(old_entries)) => union_entries(old_entries, new_entries),
            Some(_) => {
                return Err(WikiError::MalformedResponse(format!(
                    "query.pages.{}.{} is not a list",
                    page_id, field
                )))
            }
        }
    }

    Ok(old)
}

fn append_list(query: &mut Map<String, Value>, field: &str, new_list: &Value) -> Result<()> {
    match (query.get_mut(field), new_list) {
        (Some(Value::Array(old_items)), Value::Array(_)) => {
            union_entries(old_items, new_list);
        }
        (None, _) => {
            query.insert(field.to_string(), new_list.clone());
        }
        _ => {
            return Err(WikiError::MalformedResponse(format!(
                "query.{} is not a list",
                field
            )))
        }
    }
    Ok(())
}

/// Unions two entry lists, dropping exact duplicates.
///
/// Entries keep the order in which they were first seen.
fn union_entries(existing: &mut Vec<Value>, incoming: &Value) {
    let incoming = match incoming {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    let mut merged: Vec<Value> = Vec::with_capacity(existing.len() + incoming.len());
    for entry in existing.drain(..).chain(incoming.iter().cloned()) {
        if !merged.contains(&entry) {
            merged.push(entry);
        }
    }
    *existing = merged;
}
