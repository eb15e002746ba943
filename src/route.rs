//! A single registered route and its match contract.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::assets::StaticResolver;
use crate::error::{HandlerError, Rejection};
use crate::handler::BoxedHandler;
use crate::pattern::Pattern;
use crate::payload::Payload;
use crate::request::Request;

/// Result of offering a request to one route.
pub(crate) enum Applied {
    NoMatch,
    /// The path matched but the route serves another method.
    MethodMismatch,
    Handled(Result<Payload, Rejection>),
}

pub(crate) enum Route {
    Handler(HandlerRoute),
    Static(StaticRoute),
}

impl Route {
    pub(crate) async fn try_apply(&self, req: &Arc<Request>) -> Applied {
        match self {
            Self::Handler(route) => route.try_apply(req).await,
            Self::Static(route) => route.try_apply(req),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(r) => write!(f, "{} {}", r.method, r.pattern.as_str()),
            Self::Static(_) => f.write_str("GET <static>"),
        }
    }
}

/// Method + pattern + handler. Arity was checked when it was built.
pub(crate) struct HandlerRoute {
    method: Method,
    pattern: Pattern,
    handler: BoxedHandler,
}

impl HandlerRoute {
    pub(crate) fn new(method: Method, pattern: Pattern, handler: BoxedHandler) -> Self {
        Self { method, pattern, handler }
    }

    async fn try_apply(&self, req: &Arc<Request>) -> Applied {
        let Some(captures) = self.pattern.captures(req.path(), req.query()) else {
            return Applied::NoMatch;
        };
        if req.method() != self.method {
            return Applied::MethodMismatch;
        }
        Applied::Handled(self.handler.call(Arc::clone(req), captures).await)
    }
}

/// Catch-all GET route backed by a [`StaticResolver`].
pub(crate) struct StaticRoute {
    resolver: Arc<dyn StaticResolver>,
}

impl StaticRoute {
    pub(crate) fn new(resolver: Arc<dyn StaticResolver>) -> Self {
        Self { resolver }
    }

    fn try_apply(&self, req: &Request) -> Applied {
        let Some(asset) = self.resolver.locate(req.path()) else {
            return Applied::NoMatch;
        };
        if req.method() != Method::GET {
            return Applied::MethodMismatch;
        }
        Applied::Handled(self.resolver.load(&asset).map_err(|e| HandlerError::new(e).into()))
    }
}
