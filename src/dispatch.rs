//! End-to-end request handling: filters, then routes, then negotiation.
//!
//! # Reconfiguration
//!
//! The [`Dispatcher`] holds its [`Router`] behind an [`ArcSwap`]. Each
//! dispatch loads the current snapshot once, lock-free, and keeps it for the
//! whole request. [`install`](Dispatcher::install),
//! [`configure`](Dispatcher::configure) and [`reset`](Dispatcher::reset)
//! publish a complete new router in one store, so no request ever sees half
//! a table.
//!
//! Reconfigure only when no in-flight request needs the new table: at
//! startup, or between isolated test cases. A request that started before
//! the swap finishes against the old routes.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::FutureExt;
use tracing::{error, warn};

use crate::error::{ConfigError, Rejection};
use crate::observe::{DispatchEvent, DispatchObserver, Outcome, TraceObserver};
use crate::request::Request;
use crate::response::{Response, negotiate};
use crate::router::Router;
use crate::table::Scan;

/// Routes requests through the current [`Router`] snapshot.
pub struct Dispatcher {
    router: ArcSwap<Router>,
    observer: Arc<dyn DispatchObserver>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self {
            router: ArcSwap::from_pointee(router),
            observer: Arc::new(TraceObserver),
        }
    }

    /// Replaces the default [`TraceObserver`].
    pub fn with_observer(mut self, observer: impl DispatchObserver) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Publishes `router` in place of the current one.
    pub fn install(&self, router: Router) {
        self.router.store(Arc::new(router));
    }

    /// Builds a router from scratch and publishes it if `build` succeeds.
    ///
    /// On error the current router stays in place.
    pub fn configure<F>(&self, build: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Router) -> Result<Router, ConfigError>,
    {
        let router = build(Router::new())?;
        self.install(router);
        Ok(())
    }

    /// Publishes an empty router: no routes, no filters.
    pub fn reset(&self) {
        self.install(Router::new());
    }

    /// The current snapshot.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Handles one request. Never fails: every error becomes a status code.
    pub async fn dispatch(&self, req: Request) -> Response {
        let router = self.router.load_full();
        let req = Arc::new(req);

        let (outcome, response) = match AssertUnwindSafe(route(&router, &req)).catch_unwind().await {
            Ok(done) => done,
            Err(_) => {
                error!(method = %req.method(), path = req.path(), "handler panicked");
                (Outcome::Failed, Response::server_error())
            }
        };

        self.observer.on_dispatch(&DispatchEvent {
            method: req.method(),
            path: req.path(),
            outcome,
            status: response.status(),
        });
        response
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Router::new())
    }
}

async fn route(router: &Router, req: &Arc<Request>) -> (Outcome, Response) {
    if let Some(payload) = router.run_filters(req) {
        return (Outcome::Filtered, negotiate(payload).await);
    }

    match router.scan(req).await {
        Scan::Handled(Ok(payload)) => (Outcome::Handled, negotiate(payload).await),
        Scan::Handled(Err(Rejection::Binding(e))) => {
            warn!(method = %req.method(), path = req.path(), "binding failed: {e}");
            (Outcome::BadRequest, Response::bad_request())
        }
        Scan::Handled(Err(Rejection::Handler(e))) => {
            error!(method = %req.method(), path = req.path(), "handler failed: {e}");
            (Outcome::Failed, Response::server_error())
        }
        Scan::MethodNotAllowed => (Outcome::MethodNotAllowed, Response::method_not_allowed()),
        Scan::NotFound => (Outcome::NotFound, Response::not_found()),
    }
}
