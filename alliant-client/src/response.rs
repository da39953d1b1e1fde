//! Typed wrappers around API responses
//!
//! Every call returns the raw HTTP response wrapped in an [`ApiResponse`],
//! which parses the `{ "result", "errors", "warnings" }` envelope once at
//! construction. Resource-specific wrappers ([`Collection`], [`Adjustment`],
//! [`Contract`]) add fields derived from `result`, also computed once, and
//! deref to the underlying [`ApiResponse`].

use std::fmt;
use std::ops::Deref;
use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{StatusCode, Url};
use serde_json::{Map, Value};

use crate::error::AlliantError;

/// An error or warning record reported by the API
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiMessage {
    /// Machine-readable code, when the API supplies one
    pub code: Option<String>,
    /// Human-readable text, when the API supplies one
    pub message: Option<String>,
    /// Every other key of the record
    pub details: Map<String, Value>,
}

impl ApiMessage {
    /// Read a record from the envelope; bare strings become the message
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let code = map.remove("code").and_then(|code| match code {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                });
                let message = match map.remove("message") {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                Self {
                    code,
                    message,
                    details: map,
                }
            }
            Value::String(s) => Self {
                message: Some(s),
                ..Self::default()
            },
            other => {
                let mut details = Map::new();
                details.insert("value".to_string(), other);
                Self {
                    details,
                    ..Self::default()
                }
            }
        }
    }
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "[{code}] {message}"),
            (None, Some(message)) => f.write_str(message),
            (Some(code), None) => write!(f, "[{code}]"),
            (None, None) => write!(f, "{}", Value::Object(self.details.clone())),
        }
    }
}

/// A response from the API with its envelope parsed
///
/// Immutable once built. Errors and warnings reported in the body are data,
/// not `Err` values: inspect them with [`ApiResponse::has_errors`] and
/// [`ApiResponse::errors`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    elapsed: Duration,
    text: String,
    result: Value,
    errors: Vec<ApiMessage>,
    warnings: Vec<ApiMessage>,
}

impl ApiResponse {
    /// Build a response from its raw parts
    ///
    /// A body that is not a JSON object leaves `result` null and
    /// `errors`/`warnings` empty.
    pub fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        elapsed: Duration,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let (result, errors, warnings) = match parse_envelope(&text) {
            Some(envelope) => envelope,
            None => {
                if text.trim().is_empty() {
                    tracing::debug!(%status, path = url.path(), "response has an empty body");
                } else {
                    tracing::error!(%status, path = url.path(), "response body is not a JSON envelope");
                }
                (Value::Null, Vec::new(), Vec::new())
            }
        };

        if !errors.is_empty() {
            tracing::error!(%status, path = url.path(), ?errors, "API reported errors");
        }
        if !warnings.is_empty() {
            tracing::warn!(%status, path = url.path(), ?warnings, "API reported warnings");
        }

        Self {
            status,
            headers,
            url,
            elapsed,
            text,
            result,
            errors,
            warnings,
        }
    }

    /// Read the body of a blocking response; `started` is when the request was sent
    pub(crate) fn from_blocking(
        response: reqwest::blocking::Response,
        started: Instant,
    ) -> Result<Self, AlliantError> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let text = response.text()?;
        Ok(Self::from_parts(
            status,
            headers,
            url,
            started.elapsed(),
            text,
        ))
    }

    /// Drop the query string from the recorded URL
    pub(crate) fn without_query(mut self) -> Self {
        self.url.set_query(None);
        self
    }

    /// `result` from the envelope, or `Value::Null` when absent
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn errors(&self) -> &[ApiMessage] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ApiMessage] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// True when the status code is below 400 (and at least 200)
    pub fn ok(&self) -> bool {
        (200..400).contains(&self.status.as_u16())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Canonical reason phrase for the status code
    pub fn reason(&self) -> Option<&'static str> {
        self.status.canonical_reason()
    }

    /// Final URL of the request
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Time from sending the request to reading the whole body
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Charset declared in the `Content-Type` header
    pub fn encoding(&self) -> Option<&str> {
        let content_type = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        content_type.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
        })
    }

    /// Raw body text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fail with [`AlliantError::Http`] if the status is a client or server error
    ///
    /// Never called implicitly by the client.
    pub fn error_for_status(&self) -> Result<&Self, AlliantError> {
        if self.status.is_client_error() || self.status.is_server_error() {
            Err(AlliantError::Http {
                status: self.status,
                url: self.url.clone(),
            })
        } else {
            Ok(self)
        }
    }
}

type Envelope = (Value, Vec<ApiMessage>, Vec<ApiMessage>);

fn parse_envelope(text: &str) -> Option<Envelope> {
    let Value::Object(mut map) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };
    let result = map.remove("result").unwrap_or(Value::Null);
    let errors = messages(map.remove("errors"));
    let warnings = messages(map.remove("warnings"));
    Some((result, errors, warnings))
}

fn messages(value: Option<Value>) -> Vec<ApiMessage> {
    match value {
        Some(Value::Array(items)) => items.into_iter().map(ApiMessage::from_value).collect(),
        _ => Vec::new(),
    }
}

/// A response type built from an [`ApiResponse`]
pub trait TypedResponse: Sized {
    /// Wrap `response`, computing any derived fields
    fn from_response(response: ApiResponse) -> Self;

    /// The underlying response
    fn response(&self) -> &ApiResponse;
}

impl TypedResponse for ApiResponse {
    fn from_response(response: ApiResponse) -> Self {
        response
    }

    fn response(&self) -> &ApiResponse {
        self
    }
}

/// A response whose `result` is a list of records
///
/// The API normally returns a paged object
/// (`{ "items": [..], "itemCount", "totalItemCount", "nextPageUrl", .. }`);
/// a bare list in `result` is accepted as well.
#[derive(Debug, Clone)]
pub struct Collection {
    response: ApiResponse,
    items: Vec<Value>,
    guids: Vec<String>,
    item_count: Option<u64>,
    total_item_count: Option<u64>,
    next_page_url: Option<String>,
    previous_page_url: Option<String>,
}

impl Collection {
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// GUIDs of the items that carry one, in item order
    pub fn guids(&self) -> &[String] {
        &self.guids
    }

    pub fn item_count(&self) -> Option<u64> {
        self.item_count
    }

    pub fn total_item_count(&self) -> Option<u64> {
        self.total_item_count
    }

    pub fn next_page_url(&self) -> Option<&str> {
        self.next_page_url.as_deref()
    }

    pub fn previous_page_url(&self) -> Option<&str> {
        self.previous_page_url.as_deref()
    }
}

impl TypedResponse for Collection {
    fn from_response(response: ApiResponse) -> Self {
        let result = response.result();
        let items = match result {
            Value::Array(items) => items.clone(),
            Value::Object(page) => match page.get("items") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        let guids = items
            .iter()
            .filter_map(|item| item.get("guid").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        let text_field = |key: &str| result.get(key).and_then(Value::as_str).map(str::to_string);
        let count_field = |key: &str| result.get(key).and_then(Value::as_u64);
        let item_count = count_field("itemCount");
        let total_item_count = count_field("totalItemCount");
        let next_page_url = text_field("nextPageUrl");
        let previous_page_url = text_field("previousPageUrl");

        Self {
            response,
            items,
            guids,
            item_count,
            total_item_count,
            next_page_url,
            previous_page_url,
        }
    }

    fn response(&self) -> &ApiResponse {
        &self.response
    }
}

impl Deref for Collection {
    type Target = ApiResponse;

    fn deref(&self) -> &ApiResponse {
        &self.response
    }
}

fn status_display_name(result: &Value) -> Option<String> {
    result
        .pointer("/statusReference/displayName")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// A single adjustment header record
#[derive(Debug, Clone)]
pub struct Adjustment {
    response: ApiResponse,
    status: Option<String>,
}

impl Adjustment {
    /// Display name of the adjustment's status, e.g. `In Setup`
    pub fn adjustment_status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl TypedResponse for Adjustment {
    fn from_response(response: ApiResponse) -> Self {
        let status = status_display_name(response.result());
        Self { response, status }
    }

    fn response(&self) -> &ApiResponse {
        &self.response
    }
}

impl Deref for Adjustment {
    type Target = ApiResponse;

    fn deref(&self) -> &ApiResponse {
        &self.response
    }
}

/// A single contract record
#[derive(Debug, Clone)]
pub struct Contract {
    response: ApiResponse,
    status: Option<String>,
}

impl Contract {
    /// Display name of the contract's status, e.g. `Active`
    pub fn contract_status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl TypedResponse for Contract {
    fn from_response(response: ApiResponse) -> Self {
        let status = status_display_name(response.result());
        Self { response, status }
    }

    fn response(&self) -> &ApiResponse {
        &self.response
    }
}

impl Deref for Contract {
    type Target = ApiResponse;

    fn deref(&self) -> &ApiResponse {
        &self.response
    }
}
