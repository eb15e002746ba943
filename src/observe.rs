//! Dispatch observation hook.

use std::fmt;

use http::{Method, StatusCode};
use tracing::debug;

/// How a dispatch ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// A filter answered.
    Filtered,
    /// A route answered.
    Handled,
    NotFound,
    MethodNotAllowed,
    /// A captured or form value did not bind.
    BadRequest,
    /// The handler returned an error or panicked.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Filtered         => "filtered",
            Self::Handled          => "handled",
            Self::NotFound         => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::BadRequest       => "bad_request",
            Self::Failed           => "failed",
        })
    }
}

/// One finished dispatch.
#[derive(Debug)]
pub struct DispatchEvent<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub outcome: Outcome,
    pub status: StatusCode,
}

/// Called once per dispatch, after the response is built.
///
/// Closures taking `&DispatchEvent` implement it.
pub trait DispatchObserver: Send + Sync + 'static {
    fn on_dispatch(&self, event: &DispatchEvent<'_>);
}

impl<F> DispatchObserver for F
where
    F: Fn(&DispatchEvent<'_>) + Send + Sync + 'static,
{
    fn on_dispatch(&self, event: &DispatchEvent<'_>) {
        self(event)
    }
}

/// Default observer: one `debug` event per request.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceObserver;

impl DispatchObserver for TraceObserver {
    fn on_dispatch(&self, event: &DispatchEvent<'_>) {
        debug!(
            method = %event.method,
            path = event.path,
            status = event.status.as_u16(),
            outcome = %event.outcome,
            "dispatched",
        );
    }
}
