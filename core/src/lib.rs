//! I/O-free request/response pipeline for the Nearby venue API.
//!
//! # Overview
//! Builds `HttpRequest` values and interprets `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the actual
//! HTTP round-trip, so request encoding and failure classification are fully
//! deterministic and testable.
//!
//! # Design
//! - `RequestDescriptor` declares one call; `build` encodes it, placing
//!   parameters in the body or the query string depending on the method.
//! - `Resource<T>` pairs the encoded request with a decoder into `T`.
//! - `parsing` turns raw bytes into JSON or into an `ApplicationError`;
//!   every failure ends up in that one taxonomy.
//! - `NearbyApi` is the catalogue of venue endpoints the app calls.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod parsing;
pub mod resource;
pub mod router;
pub mod types;

pub use client::NearbyApi;
pub use config::ApiConfig;
pub use error::{ApiErrorBody, ApplicationError, ConfigError, RequestError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{ParseFn, Resource, ServiceResult};
pub use router::RequestDescriptor;
pub use types::{Checkin, Contact, Location, Price, Restaurant, RestaurantDetail, SuggestedRestaurants};
