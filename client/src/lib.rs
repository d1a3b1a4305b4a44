//! Asynchronous transport for `nearby-core` resources.
//!
//! # Overview
//! `ApiClient` executes `Resource`s over HTTP on a tokio runtime and reports
//! each outcome exactly once, either to a `ResultSink` (`send`) or as the
//! output of a future (`fetch`). Failures are classified with the
//! `Reachability` signal into `nearby_core::ApplicationError`.
//!
//! # Design
//! - The client is an ordinary value: construct it with `ApiClient::builder`,
//!   share it by reference or `Arc`, drop it to tear it down.
//! - `sign_out` replaces the HTTP session and cancels every request still in
//!   flight on the old one.
//! - Components talk through narrow traits (`ResultSink`, `Reachability`)
//!   instead of holding references to each other.

pub mod config;
pub mod reachability;
pub mod sink;
pub mod transport;

pub use config::ClientConfig;
pub use reachability::{Connectivity, Reachability, ReachabilityFlag};
pub use sink::ResultSink;
pub use transport::{ApiClient, ApiClientBuilder, ClientError, RequestHandle};
