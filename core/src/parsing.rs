//! Raw response bytes to generic JSON, or to an `ApplicationError`.
//!
//! `parse_data` is the success path and `parse_error` the error path. Neither
//! knows about the caller's typed value; `Resource` applies that mapping on
//! top of `parse_data`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiErrorBody, ApplicationError, RESPONSE_SERIALIZATION_ERROR, WRONG_ERROR_FORMAT};

#[derive(Deserialize)]
struct ErrorEnvelope {
    meta: ApiErrorBody,
}

/// Decode a success body into a JSON object.
///
/// An empty body decodes to `Value::Null`. Anything that is not a JSON object
/// (arrays and bare scalars included) goes through `parse_error`.
pub fn parse_data(body: &[u8]) -> Result<Value, ApplicationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => {
            tracing::debug!(json = %value, "json to parse");
            Ok(value)
        }
        Ok(value) => {
            tracing::debug!(json = %value, "success body is not a json object");
            Err(parse_error(body))
        }
        Err(err) => {
            tracing::debug!(error = %err, "success body is not json");
            Err(parse_error(body))
        }
    }
}

/// Classify an error body.
pub fn parse_error(body: &[u8]) -> ApplicationError {
    let value = match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "error while serializing error body");
            return ApplicationError::server(RESPONSE_SERIALIZATION_ERROR);
        }
    };

    tracing::debug!(json = %value, "got error from server");
    match serde_json::from_value::<ErrorEnvelope>(value) {
        Ok(envelope) => ApplicationError::Api(envelope.meta),
        Err(err) => {
            tracing::warn!(error = %err, "error while parsing error body");
            ApplicationError::server(WRONG_ERROR_FORMAT)
        }
    }
}

/// Classify a failure that produced no usable response.
///
/// Offline (or unknown connectivity) wins over whatever the server sent.
pub fn classify_failure(body: &[u8], reachable: bool) -> ApplicationError {
    if reachable {
        parse_error(body)
    } else {
        ApplicationError::Internet
    }
}
