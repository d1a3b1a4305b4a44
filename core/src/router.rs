//! Request descriptors and the builder that turns them into `HttpRequest`s.
//!
//! # Design
//! A `RequestDescriptor` states everything about one logical API call:
//! method, base URL, path, headers, timeout and an optional parameter map.
//! Where the parameters go is decided by the method alone. Write methods
//! (POST, PUT, PATCH) send them as a JSON body and never in the query string;
//! read methods (GET, HEAD, DELETE) send them as a form-encoded query string
//! and never carry a body.
//!
//! Building is fallible. An invalid URL or an unserializable body is a
//! `RequestError` at construction time, so a request that cannot be encoded
//! is never sent.

use std::collections::BTreeMap;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest};

/// Applied when a descriptor does not set its own timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Declarative description of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub base_url: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
    pub parameters: Option<Map<String, Value>>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.into(),
            path: path.into(),
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            parameters: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add one parameter, creating the map on first use.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Merge every field of a serializable value into the parameter map.
    ///
    /// Fails with `RequestError::Parameters` unless `value` serializes to a
    /// JSON object.
    pub fn json_parameters<S: Serialize + ?Sized>(mut self, value: &S) -> Result<Self, RequestError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => {
                self.parameters.get_or_insert_with(Map::new).extend(fields);
                Ok(self)
            }
            other => Err(RequestError::Parameters(json_kind(&other).to_string())),
        }
    }

    /// Produce the transport-ready request.
    pub fn build(&self) -> Result<HttpRequest, RequestError> {
        let raw_url = format!("{}{}", self.base_url, self.path);
        let mut url = Url::parse(&raw_url).map_err(|source| RequestError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;

        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = if self.method.carries_body() {
            let empty = Map::new();
            let parameters = self.parameters.as_ref().unwrap_or(&empty);
            let body = serde_json::to_string(parameters)?;
            if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type")) {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
            }
            Some(body)
        } else {
            if let Some(parameters) = self.parameters.as_ref().filter(|p| !p.is_empty()) {
                url.query_pairs_mut().extend_pairs(query_pairs(parameters));
            }
            None
        };

        tracing::trace!(method = %self.method, url = %url, "built request");

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

/// Percent-encode `raw` so it occupies exactly one path segment.
///
/// Empty, `.` and `..` would be collapsed by URL normalization and are
/// rejected.
pub fn path_segment(raw: &str) -> Result<String, RequestError> {
    if matches!(raw, "" | "." | "..") {
        return Err(RequestError::PathSegment(raw.to_string()));
    }
    Ok(utf8_percent_encode(raw, PATH_SEGMENT).to_string())
}

/// Flatten a parameter map into form pairs, keys sorted.
///
/// Arrays repeat `key[]`, nested objects become `key[sub]`, booleans are
/// `1`/`0`, and null is an empty value.
pub fn query_pairs(parameters: &Map<String, Value>) -> Vec<(String, String)> {
    let mut entries: Vec<(&String, &Value)> = parameters.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut pairs = Vec::new();
    for (key, value) in entries {
        flatten(key, value, &mut pairs);
    }
    pairs
}

fn flatten(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(fields) => {
            let mut nested: Vec<(&String, &Value)> = fields.iter().collect();
            nested.sort_by(|a, b| a.0.cmp(b.0));
            for (sub, value) in nested {
                flatten(&format!("{key}[{sub}]"), value, pairs);
            }
        }
        Value::Array(items) => {
            for value in items {
                flatten(&format!("{key}[]"), value, pairs);
            }
        }
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        Value::Bool(b) => pairs.push((key.to_string(), if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key.to_string(), n.to_string())),
        Value::Null => pairs.push((key.to_string(), String::new())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
