//! Error types for the Nearby API pipeline.
//!
//! # Design
//! `ApplicationError` is the closed taxonomy every failed request collapses
//! into before it reaches a caller. Each variant has three renderings: a
//! short `title`, a user-facing `message`, and the `Display` output, which is
//! the debug description meant for logs.
//!
//! `RequestError` covers failures that happen before any I/O, while a
//! `Resource` is being constructed. `ConfigError` covers environment loading.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server message for an error body that is not JSON at all.
pub const RESPONSE_SERIALIZATION_ERROR: &str = "Response Serialization Error";

/// Server message for an error body that is JSON but not the API error shape.
pub const WRONG_ERROR_FORMAT: &str = "Wrong Error Format";

const GENERIC_MESSAGE: &str = "Something went wrong. Try again!";

/// Errors delivered to callers through `ServiceResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// The request failed and the device is (or may be) offline.
    #[error("Internet not working")]
    Internet,

    /// A 2xx response whose JSON did not match the resource's typed shape.
    #[error("Parsing Error: {cause}")]
    Parsing { cause: String },

    /// An error response that could not be decoded, or a success body that
    /// was not JSON.
    #[error("Server Error: {message}")]
    Server { message: String },

    /// An error the server declared in the API error envelope.
    #[error("API Error {0}")]
    Api(ApiErrorBody),

    /// The request was cancelled by sign-out, client teardown, or its handle.
    #[error("Request cancelled")]
    Cancelled,
}

impl ApplicationError {
    pub fn parsing(cause: impl fmt::Display) -> Self {
        ApplicationError::Parsing {
            cause: cause.to_string(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        ApplicationError::Server {
            message: message.into(),
        }
    }

    /// Short heading suitable for an alert title.
    pub fn title(&self) -> &str {
        match self {
            ApplicationError::Internet => "No Internet!",
            ApplicationError::Parsing { .. } => "Error",
            ApplicationError::Server { .. } => "Server Error",
            ApplicationError::Api(_) => "API Error",
            ApplicationError::Cancelled => "Cancelled",
        }
    }

    /// Text that can be shown to a user without further translation.
    pub fn message(&self) -> &str {
        match self {
            ApplicationError::Internet => {
                "Internet seems to be down. Please try again after reconnecting!"
            }
            ApplicationError::Parsing { .. } | ApplicationError::Server { .. } => GENERIC_MESSAGE,
            ApplicationError::Api(body) => body.error_detail.as_deref().unwrap_or(GENERIC_MESSAGE),
            ApplicationError::Cancelled => "The request was cancelled.",
        }
    }

    pub fn debug_description(&self) -> String {
        self.to_string()
    }
}

/// Fields of the API error envelope: `{"meta": {"code": .., "errorType": ..,
/// "errorDetail": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.code)?;
        match (&self.error_detail, &self.error_type) {
            (Some(detail), _) => write!(f, ": {detail}"),
            (None, Some(kind)) => write!(f, ": {kind}"),
            (None, None) => Ok(()),
        }
    }
}

/// Failures while turning a `RequestDescriptor` into an `HttpRequest`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// `base_url + path` is not an absolute URL.
    #[error("invalid request url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Parameters supplied from a serializable value were not a JSON object.
    #[error("request parameters must be a JSON object, got {0}")]
    Parameters(String),

    /// A value meant to fill one path segment cannot be expressed as one.
    #[error("{0:?} cannot be used as a path segment")]
    PathSegment(String),

    /// The JSON body could not be serialized.
    #[error("request body serialization failed: {0}")]
    Body(#[from] serde_json::Error),
}

/// Failures while loading `ApiConfig` from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
