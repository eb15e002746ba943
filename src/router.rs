//! The configuration surface: routes, resources, static content, filters.
//!
//! A [`Router`] is built once and handed to a [`Dispatcher`](crate::Dispatcher),
//! which treats it as an immutable snapshot. Every registration that can fail
//! returns `Result<Self, ConfigError>`, so a whole table chains with `?` and a
//! mismatched handler is reported before a single request is served.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use http::Method;

use crate::assets::{StaticDir, StaticResolver};
use crate::error::ConfigError;
use crate::filter::{Filter, FilterChain};
use crate::handler::{BoxedHandler, Handler};
use crate::pattern::Pattern;
use crate::payload::Payload;
use crate::request::Request;
use crate::resource::Resource;
use crate::route::{HandlerRoute, Route, StaticRoute};
use crate::table::{RouteTable, Scan};

/// The application router.
///
/// ```rust
/// use trellis::{ConfigError, Router};
///
/// # fn main() -> Result<(), ConfigError> {
/// let router = Router::new()
///     .get("/hello/:name", |name: String| async move { format!("Hello {name}") })?
///     .get("/add/:left/:right", |l: i32, r: i32| async move { l + r })?
///     .post("/post", || async { "Done" })?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Router {
    table: RouteTable,
    filters: FilterChain,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Args>(self, pattern: &str, handler: impl Handler<Args>) -> Result<Self, ConfigError> {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post<Args>(self, pattern: &str, handler: impl Handler<Args>) -> Result<Self, ConfigError> {
        self.on(Method::POST, pattern, handler)
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// The route takes priority over every route registered before it.
    /// Fails if the handler binds a different number of values than the
    /// pattern captures.
    pub fn on<Args>(mut self, method: Method, pattern: &str, handler: impl Handler<Args>) -> Result<Self, ConfigError> {
        self.add(method, pattern, handler.into_boxed_handler())?;
        Ok(self)
    }

    /// Registers every descriptor of `resource`, with `prefix` prepended to
    /// each of its patterns.
    ///
    /// All patterns are checked before any route is added, so a failing mount
    /// leaves the router untouched.
    pub fn mount(mut self, prefix: &str, resource: Resource) -> Result<Self, ConfigError> {
        let mut routes = Vec::new();
        for entry in resource.into_entries() {
            for pattern in &entry.patterns {
                let full = Pattern::join(prefix, pattern);
                let route = Self::build(entry.method.clone(), &full, Arc::clone(&entry.handler))?;
                routes.push(route);
            }
        }
        for route in routes {
            self.table.prepend(route);
        }
        Ok(self)
    }

    /// [`mount`](Router::mount) without a prefix.
    pub fn resource(self, resource: Resource) -> Result<Self, ConfigError> {
        self.mount("", resource)
    }

    /// Serves files under `root` for any GET no handler route claims.
    pub fn static_dir(self, root: impl Into<PathBuf>) -> Self {
        self.static_assets(StaticDir::new(root))
    }

    /// Lowest-priority catch-all GET route backed by `resolver`.
    pub fn static_assets(mut self, resolver: impl StaticResolver) -> Self {
        self.table.append(Route::Static(StaticRoute::new(Arc::new(resolver))));
        self
    }

    /// Appends a filter. Filters run before routes, in registration order.
    pub fn filter(mut self, filter: impl Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Drops every route and filter.
    pub fn reset(&mut self) {
        self.table.clear();
        self.filters.clear();
    }

    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub(crate) fn run_filters(&self, req: &Request) -> Option<Payload> {
        self.filters.apply(req)
    }

    pub(crate) async fn scan(&self, req: &Arc<Request>) -> Scan {
        self.table.dispatch(req).await
    }

    fn add(&mut self, method: Method, pattern: &str, handler: BoxedHandler) -> Result<(), ConfigError> {
        let route = Self::build(method, pattern, handler)?;
        self.table.prepend(route);
        Ok(())
    }

    fn build(method: Method, raw: &str, handler: BoxedHandler) -> Result<Route, ConfigError> {
        let pattern = Pattern::compile(raw)?;
        if pattern.param_count() != handler.arity() {
            return Err(ConfigError::ArityMismatch {
                pattern: raw.to_owned(),
                expected: pattern.param_count(),
                found: handler.arity(),
            });
        }
        if handler.binds_form() && method != Method::POST {
            return Err(ConfigError::FormRequiresPost { method, pattern: raw.to_owned() });
        }
        Ok(Route::Handler(HandlerRoute::new(method, pattern, handler)))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("table", &self.table)
            .field("filters", &self.filters)
            .finish()
    }
}
