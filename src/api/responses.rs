// src/api/responses.rs
//! Decoded API responses.
//!
//! A body is decoded and classified exactly once, right after it arrives.
//! Everything downstream matches on [`Reply`] and [`ApiPayload`] instead of
//! poking at raw JSON for an `error` key.

use crate::error::ApiErrorCode;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Top-level shape of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Object(Map<String, Value>),
    List(Vec<Value>),
}

/// A successful API response together with its HTTP headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    payload: ApiPayload,
    headers: Vec<(String, String)>,
}

impl ApiResult {
    pub fn new(payload: ApiPayload, headers: Vec<(String, String)>) -> Self {
        Self { payload, headers }
    }

    /// Wraps an object or array value; any other JSON value yields `None`.
    pub fn from_value(value: Value, headers: Vec<(String, String)>) -> Option<Self> {
        let payload = match value {
            Value::Object(map) => ApiPayload::Object(map),
            Value::Array(items) => ApiPayload::List(items),
            _ => return None,
        };
        Some(Self::new(payload, headers))
    }

    pub fn payload(&self) -> &ApiPayload {
        &self.payload
    }

    pub fn into_payload(self) -> ApiPayload {
        self.payload
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match &self.payload {
            ApiPayload::Object(map) => Some(map),
            ApiPayload::List(_) => None,
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match &mut self.payload {
            ApiPayload::Object(map) => Some(map),
            ApiPayload::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.payload {
            ApiPayload::List(items) => Some(items),
            ApiPayload::Object(_) => None,
        }
    }

    /// A top-level field of an object result.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// The `query` object of an `action=query` result.
    pub fn query(&self) -> Option<&Map<String, Value>> {
        self.get("query").and_then(Value::as_object)
    }

    pub fn to_value(&self) -> Value {
        match &self.payload {
            ApiPayload::Object(map) => Value::Object(map.clone()),
            ApiPayload::List(items) => Value::Array(items.clone()),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

/// Classification of one response body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    Success(ApiResult),
    ApiError { code: ApiErrorCode, info: String },
    /// Not JSON, or JSON of a shape the API never returns at top level
    Unrecognized,
}

impl Reply {
    pub(crate) fn classify(body: &str, headers: Vec<(String, String)>) -> Self {
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Response is not JSON: {}", e);
                return Self::Unrecognized;
            }
        };

        if let Some(error) = value.get("error") {
            return match ApiErrorBody::deserialize(error) {
                Ok(body) => Self::ApiError {
                    code: ApiErrorCode::from_api_response(&body.code),
                    info: body.info,
                },
                Err(_) => Self::ApiError {
                    code: ApiErrorCode::Unknown("unknown".to_string()),
                    info: error.to_string(),
                },
            };
        }

        match ApiResult::from_value(value, headers) {
            Some(result) => Self::Success(result),
            None => Self::Unrecognized,
        }
    }
}
