//! Typed resources: a built request plus the function that decodes its
//! response.
//!
//! # Design
//! `Resource<T>` is built once per call site and never mutated. The request
//! is encoded when the resource is constructed, so every encoding failure is
//! reported before any I/O happens. Interpreting a response is a pure
//! function of the response bytes, the status code, and the reachability
//! signal the host observed, which keeps classification testable without a
//! network.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApplicationError, RequestError};
use crate::http::{HttpRequest, HttpResponse};
use crate::parsing;
use crate::router::RequestDescriptor;

/// Outcome delivered to a caller for one request.
pub type ServiceResult<T> = Result<T, ApplicationError>;

/// Maps the generic JSON of a 2xx response into the caller's type.
pub type ParseFn<T> = dyn Fn(Value) -> Result<T, serde_json::Error> + Send + Sync;

pub struct Resource<T> {
    descriptor: RequestDescriptor,
    request: HttpRequest,
    parse: Arc<ParseFn<T>>,
}

impl<T> Resource<T> {
    pub fn new<F>(descriptor: RequestDescriptor, parse: F) -> Result<Self, RequestError>
    where
        F: Fn(Value) -> Result<T, serde_json::Error> + Send + Sync + 'static,
    {
        let request = descriptor.build()?;
        Ok(Self {
            descriptor,
            request,
            parse: Arc::new(parse),
        })
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Shared handle to the decoder, for hosts that move it into a task.
    pub fn parser(&self) -> Arc<ParseFn<T>> {
        Arc::clone(&self.parse)
    }

    /// Interpret a response the host received.
    ///
    /// `reachable` is only consulted when the status is outside 200..=299.
    pub fn parse_response(&self, response: &HttpResponse, reachable: bool) -> ServiceResult<T> {
        interpret(&*self.parse, response, reachable)
    }

    /// Interpret a transport failure that produced no response at all.
    pub fn parse_transport_failure(&self, reachable: bool) -> ApplicationError {
        parsing::classify_failure(&[], reachable)
    }
}

impl<T: DeserializeOwned + 'static> Resource<T> {
    /// A resource whose whole response body deserializes into `T`.
    pub fn json(descriptor: RequestDescriptor) -> Result<Self, RequestError> {
        Self::new(descriptor, serde_json::from_value)
    }
}

/// Shared by `Resource::parse_response` and hosts holding only a `ParseFn`.
pub fn interpret<T>(parse: &ParseFn<T>, response: &HttpResponse, reachable: bool) -> ServiceResult<T> {
    if !response.is_success() {
        tracing::debug!(status = response.status, "response status outside 200..=299");
        return Err(parsing::classify_failure(&response.body, reachable));
    }

    let json = parsing::parse_data(&response.body)?;
    parse(json).map_err(|err| {
        tracing::warn!(error = %err, "typed mapping failed");
        ApplicationError::parsing(err)
    })
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            request: self.request.clone(),
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
