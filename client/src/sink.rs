//! Destinations for a finished request.
//!
//! A sink is consumed by `deliver`, so the type system already rules out a
//! second delivery; the client guarantees the first one.

use nearby_core::ServiceResult;
use tokio::sync::{mpsc, oneshot};

pub trait ResultSink<T>: Send + 'static {
    fn deliver(self, result: ServiceResult<T>);
}

impl<T, F> ResultSink<T> for F
where
    F: FnOnce(ServiceResult<T>) + Send + 'static,
{
    fn deliver(self, result: ServiceResult<T>) {
        self(result)
    }
}

impl<T: Send + 'static> ResultSink<T> for oneshot::Sender<ServiceResult<T>> {
    fn deliver(self, result: ServiceResult<T>) {
        if self.send(result).is_err() {
            tracing::debug!("result receiver dropped before delivery");
        }
    }
}

impl<T: Send + 'static> ResultSink<T> for mpsc::UnboundedSender<ServiceResult<T>> {
    fn deliver(self, result: ServiceResult<T>) {
        if self.send(result).is_err() {
            tracing::debug!("result channel closed before delivery");
        }
    }
}
