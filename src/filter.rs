//! Pre-route filters.
//!
//! Filters run before any route, in registration order. The first one that
//! returns a payload answers the request and nothing else runs.

use std::fmt;
use std::sync::Arc;

use crate::payload::Payload;
use crate::request::Request;

/// A pre-route interceptor.
///
/// Implemented for any `Fn(&Request) -> Option<Payload>`:
///
/// ```rust
/// use trellis::{Payload, Request, Router};
///
/// let router = Router::new().filter(|req: &Request| {
///     (req.path() == "/").then(|| Payload::html("FILTERED"))
/// });
/// ```
pub trait Filter: Send + Sync + 'static {
    /// `Some` handles the request; `None` passes it on.
    fn apply(&self, req: &Request) -> Option<Payload>;
}

impl<F> Filter for F
where
    F: Fn(&Request) -> Option<Payload> + Send + Sync + 'static,
{
    fn apply(&self, req: &Request) -> Option<Payload> {
        self(req)
    }
}

/// Filters in the order they were registered.
#[derive(Clone, Default)]
pub(crate) struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub(crate) fn push(&mut self, filter: impl Filter) {
        self.filters.push(Arc::new(filter));
    }

    pub(crate) fn apply(&self, req: &Request) -> Option<Payload> {
        self.filters.iter().find_map(|f| f.apply(req))
    }

    pub(crate) fn clear(&mut self) {
        self.filters.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.filters.len()
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain").field("len", &self.filters.len()).finish()
    }
}
