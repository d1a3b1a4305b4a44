//! The transport client: executes `Resource`s over HTTP and classifies the
//! outcome.
//!
//! # Design
//! `ApiClient` owns one `Session` at a time: a `ureq` agent plus a
//! `CancellationToken`. Every request observes a child of the session token,
//! so `sign_out` cancels all of them at once by swapping in a fresh session
//! and cancelling the old token. A request's own `RequestHandle` cancels only
//! its child token.
//!
//! HTTP I/O is blocking and runs on the runtime's blocking pool. The task
//! awaiting it races the I/O against cancellation with cancellation biased
//! first, and the token is checked again right before delivery, so a request
//! cancelled before its sink runs never reports success.

use std::fmt;
use std::sync::Arc;

use nearby_core::parsing::classify_failure;
use nearby_core::resource::{interpret, ParseFn};
use nearby_core::{ApplicationError, HttpMethod, HttpRequest, HttpResponse, Resource, ServiceResult};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use ureq::typestate::WithBody;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::reachability::{Reachability, ReachabilityFlag};
use crate::sink::ResultSink;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no tokio runtime available: build the client inside a runtime or pass a handle")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// One generation of the HTTP agent; replaced on sign-out.
#[derive(Clone)]
struct Session {
    generation: u64,
    agent: ureq::Agent,
    token: CancellationToken,
}

impl Session {
    fn new(config: &ClientConfig, generation: u64) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .user_agent(config.user_agent.clone())
            .timeout_connect(config.connect_timeout)
            .build()
            .new_agent();
        Self {
            generation,
            agent,
            token: CancellationToken::new(),
        }
    }
}

pub struct ApiClient {
    config: ClientConfig,
    reachability: Arc<dyn Reachability>,
    runtime: Handle,
    session: RwLock<Session>,
}

#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    reachability: Option<Arc<dyn Reachability>>,
    runtime: Option<Handle>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Without a provider, connectivity is `Unknown` and every failure is
    /// classified as `ApplicationError::Internet`.
    pub fn reachability(mut self, reachability: Arc<dyn Reachability>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    /// Runtime that runs request tasks. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()?,
        };
        let reachability = self
            .reachability
            .unwrap_or_else(|| Arc::new(ReachabilityFlag::default()));
        let session = Session::new(&self.config, 0);
        tracing::debug!(user_agent = %self.config.user_agent, "api client created");
        Ok(ApiClient {
            config: self.config,
            reachability,
            runtime,
            session: RwLock::new(session),
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn reachability(&self) -> &Arc<dyn Reachability> {
        &self.reachability
    }

    /// Incremented by every `sign_out`.
    pub fn session_generation(&self) -> u64 {
        self.session.read().generation
    }

    /// Issue the request in the background and hand its outcome to `sink`.
    ///
    /// Returns immediately. `sink` runs exactly once, on a runtime worker,
    /// unless the runtime itself shuts down first.
    pub fn send<T, S>(&self, resource: &Resource<T>, sink: S) -> RequestHandle
    where
        T: Send + 'static,
        S: ResultSink<T>,
    {
        let call = self.call(resource);
        let id = call.id;
        let token = call.token.clone();
        let guard = call.token.clone();
        let span = call.span();
        let task = self.runtime.spawn(
            async move {
                let result = call.run().await;
                sink.deliver(settle(&guard, result));
            }
            .instrument(span),
        );
        RequestHandle { id, token, task }
    }

    /// Awaitable form of `send`, cancelled by `sign_out` the same way.
    pub async fn fetch<T>(&self, resource: &Resource<T>) -> ServiceResult<T>
    where
        T: Send + 'static,
    {
        let call = self.call(resource);
        let guard = call.token.clone();
        let span = call.span();
        let result = call.run().instrument(span).await;
        settle(&guard, result)
    }

    /// Drop the current session and cancel everything in flight on it.
    ///
    /// Every request on the old session that has not yet been handed to its
    /// sink receives `Cancelled`. A sink already running when the session is
    /// dropped keeps the outcome it was given.
    pub fn sign_out(&self) {
        let old = {
            let mut session = self.session.write();
            let fresh = Session::new(&self.config, session.generation + 1);
            std::mem::replace(&mut *session, fresh)
        };
        old.token.cancel();
        tracing::info!(generation = old.generation, "session invalidated");
    }

    fn call<T>(&self, resource: &Resource<T>) -> Call<T> {
        let session = self.session.read();
        Call {
            id: Uuid::new_v4(),
            request: resource.request().clone(),
            parse: resource.parser(),
            agent: session.agent.clone(),
            token: session.token.child_token(),
            reachability: Arc::clone(&self.reachability),
            runtime: self.runtime.clone(),
        }
    }
}

/// Dropping the client cancels whatever is still in flight.
impl Drop for ApiClient {
    fn drop(&mut self) {
        self.session.get_mut().token.cancel();
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("reachability", &self.reachability)
            .field("generation", &self.session_generation())
            .finish_non_exhaustive()
    }
}

/// Returned by `send`. Dropping it detaches the request; it still completes.
#[derive(Debug)]
pub struct RequestHandle {
    id: Uuid,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RequestHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cancel this request only. Its sink receives `Cancelled` unless the
    /// outcome was already delivered.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the sink has been invoked.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            tracing::warn!(id = %self.id, error = %err, "request task failed");
        }
    }
}

/// Everything one request needs, detached from the client.
struct Call<T> {
    id: Uuid,
    request: HttpRequest,
    parse: Arc<ParseFn<T>>,
    agent: ureq::Agent,
    token: CancellationToken,
    reachability: Arc<dyn Reachability>,
    runtime: Handle,
}

impl<T> Call<T> {
    fn span(&self) -> tracing::Span {
        tracing::debug_span!(
            "request",
            id = %self.id,
            method = %self.request.method,
            url = %self.request.url,
        )
    }

    async fn run(self) -> ServiceResult<T> {
        let Call {
            request,
            parse,
            agent,
            token,
            reachability,
            runtime,
            ..
        } = self;

        tracing::debug!(headers = ?request.headers, body = ?request.body, "sending");
        let io = runtime.spawn_blocking(move || execute(&agent, &request));

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("cancelled while in flight");
                return Err(ApplicationError::Cancelled);
            }
            joined = io => joined,
        };

        let result = match outcome {
            Ok(Ok(response)) => {
                tracing::debug!(status = response.status, bytes = response.body.len(), "received");
                let reachable = !response.is_success() && reachability.is_reachable();
                interpret(&*parse, &response, reachable)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "transport failure");
                Err(classify_failure(&[], reachability.is_reachable()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "transport task failed");
                Err(classify_failure(&[], reachability.is_reachable()))
            }
        };

        if let Err(err) = &result {
            tracing::warn!(error = %err, title = err.title(), "request failed");
        }
        result
    }
}

/// Last check before an outcome leaves the client: a request whose token was
/// cancelled while it was being classified reports `Cancelled`.
fn settle<T>(token: &CancellationToken, result: ServiceResult<T>) -> ServiceResult<T> {
    if token.is_cancelled() {
        tracing::debug!("cancelled before delivery");
        return Err(ApplicationError::Cancelled);
    }
    result
}

fn execute(agent: &ureq::Agent, request: &HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let url = request.url.as_str();
    let body = request.body.as_deref();
    let mut response = match request.method {
        HttpMethod::Get => prepare(agent.get(url), request).call()?,
        HttpMethod::Head => prepare(agent.head(url), request).call()?,
        HttpMethod::Delete => prepare(agent.delete(url), request).call()?,
        HttpMethod::Post => send_body(prepare(agent.post(url), request), body)?,
        HttpMethod::Put => send_body(prepare(agent.put(url), request), body)?,
        HttpMethod::Patch => send_body(prepare(agent.patch(url), request), body)?,
    };

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_vec()?;

    Ok(HttpResponse { status, headers, body })
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.config().timeout_global(Some(request.timeout)).build()
}

fn send_body(
    builder: ureq::RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
