// src/api/client.rs
//! Pure HTTP client wrapper for the wiki API.
//!
//! This module owns the one place where bytes leave the process. It knows how
//! to send form fields and file parts with the right headers; it knows nothing
//! about JSON, errors returned by the API, retries or continuation.

use crate::error::{TransportError, WikiError};
use crate::types::{Credentials, FilePayload};
use reqwest::blocking::{multipart, Client};
use reqwest::header;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Everything needed to perform one HTTP round-trip.
#[derive(Debug)]
pub struct HttpCall<'a> {
    pub method: HttpMethod,
    pub url: &'a Url,
    pub fields: &'a [(String, String)],
    pub files: &'a [(String, FilePayload)],
    pub user_agent: &'a str,
    pub credentials: Option<&'a Credentials>,
}

/// The undecoded answer to an [`HttpCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The ability to perform one HTTP round-trip.
///
/// The request layer depends on this trait, never on `reqwest` directly, so
/// the retry and continuation logic can be driven by scripted responses.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, call: &HttpCall<'_>) -> Result<RawResponse, TransportError>;
}

/// A thin wrapper around the blocking reqwest client.
///
/// Keeps an in-memory cookie jar for the lifetime of the site and accepts
/// gzip-compressed bodies.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, WikiError> {
        let client = Client::builder()
            .gzip(true)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| WikiError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn multipart_form(
        fields: &[(String, String)],
        files: &[(String, FilePayload)],
    ) -> Result<multipart::Form, TransportError> {
        let mut form = multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, payload) in files {
            let mut part = multipart::Part::bytes(payload.bytes().to_vec())
                .file_name(payload.file_name().to_string());
            if let Some(mime) = payload.mime() {
                part = part.mime_str(mime)?;
            }
            form = form.part(name.clone(), part);
        }
        Ok(form)
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, call: &HttpCall<'_>) -> Result<RawResponse, TransportError> {
        log::debug!("{} {}", call.method.as_str(), call.url);

        let mut builder = match call.method {
            HttpMethod::Get => self.client.get(call.url.clone()).query(call.fields),
            HttpMethod::Post if call.files.is_empty() => {
                self.client.post(call.url.clone()).form(call.fields)
            }
            HttpMethod::Post => self
                .client
                .post(call.url.clone())
                .multipart(Self::multipart_form(call.fields, call.files)?),
        };

        builder = builder.header(header::USER_AGENT, call.user_agent);
        if let Some(credentials) = call.credentials {
            builder = builder.basic_auth(credentials.user(), Some(credentials.password()));
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text()?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
