//! Ordered route table.
//!
//! Priority is positional. Handler routes go to the front, so the last
//! definition of an overlapping pattern wins. Static routes go to the back
//! and only answer what no handler route claimed.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::Rejection;
use crate::payload::Payload;
use crate::request::Request;
use crate::route::{Applied, Route};

/// How a table scan ended.
pub(crate) enum Scan {
    Handled(Result<Payload, Rejection>),
    /// Some route matched the path, none for this method.
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug, Default)]
pub(crate) struct RouteTable {
    routes: VecDeque<Route>,
}

impl RouteTable {
    /// Highest priority: tried before every route already present.
    pub(crate) fn prepend(&mut self, route: Route) {
        self.routes.push_front(route);
    }

    /// Lowest priority: tried after every route already present.
    pub(crate) fn append(&mut self, route: Route) {
        self.routes.push_back(route);
    }

    pub(crate) fn clear(&mut self) {
        self.routes.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }

    /// Offers the request to each route in order; at most one handles it.
    ///
    /// A method mismatch does not stop the scan: a later route may serve the
    /// same path for this method. It only decides 405 over 404 at the end.
    pub(crate) async fn dispatch(&self, req: &Arc<Request>) -> Scan {
        let mut path_matched = false;
        for route in &self.routes {
            match route.try_apply(req).await {
                Applied::Handled(result) => return Scan::Handled(result),
                Applied::MethodMismatch => path_matched = true,
                Applied::NoMatch => {}
            }
        }
        if path_matched { Scan::MethodNotAllowed } else { Scan::NotFound }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::handler::{BoxedHandler, Handler};
    use crate::pattern::Pattern;
    use crate::route::HandlerRoute;

    fn constant(body: &'static str) -> BoxedHandler {
        (move || async move { body }).into_boxed_handler()
    }

    fn route(method: Method, pattern: &str, body: &'static str) -> Route {
        Route::Handler(HandlerRoute::new(method, Pattern::compile(pattern).unwrap(), constant(body)))
    }

    async fn scan(table: &RouteTable, method: Method, path: &str) -> Scan {
        table.dispatch(&Arc::new(Request::new(method, path))).await
    }

    fn content_type(scan: Scan) -> String {
        match scan {
            Scan::Handled(Ok(p)) => p.content_type().to_owned(),
            _ => panic!("not handled"),
        }
    }

    #[tokio::test]
    async fn last_registered_wins() {
        let mut table = RouteTable::default();
        table.prepend(Route::Handler(HandlerRoute::new(
            Method::GET,
            Pattern::compile("/:any").unwrap(),
            (|_: String| async { Payload::new("text/first", "") }).into_boxed_handler(),
        )));
        table.prepend(Route::Handler(HandlerRoute::new(
            Method::GET,
            Pattern::compile("/hello").unwrap(),
            (|| async { Payload::new("text/second", "") }).into_boxed_handler(),
        )));
        assert_eq!(content_type(scan(&table, Method::GET, "/hello").await), "text/second");
        assert_eq!(content_type(scan(&table, Method::GET, "/other").await), "text/first");
    }

    #[tokio::test]
    async fn mismatch_keeps_scanning() {
        let mut table = RouteTable::default();
        table.prepend(route(Method::GET, "/action", "GET"));
        table.prepend(route(Method::POST, "/action", "POST"));
        assert!(matches!(scan(&table, Method::GET, "/action").await, Scan::Handled(Ok(_))));
        assert!(matches!(scan(&table, Method::POST, "/action").await, Scan::Handled(Ok(_))));
    }

    #[tokio::test]
    async fn not_found_versus_method_not_allowed() {
        let mut table = RouteTable::default();
        table.prepend(route(Method::GET, "/get", "Done"));
        assert!(matches!(scan(&table, Method::POST, "/get").await, Scan::MethodNotAllowed));
        assert!(matches!(scan(&table, Method::POST, "/unknown").await, Scan::NotFound));
        assert!(matches!(scan(&table, Method::GET, "/unknown").await, Scan::NotFound));
    }

    #[test]
    fn append_goes_last() {
        let mut table = RouteTable::default();
        table.append(route(Method::GET, "/a", "a"));
        table.prepend(route(Method::GET, "/b", "b"));
        table.append(route(Method::GET, "/c", "c"));
        let order: Vec<_> = table.routes.iter().map(|r| format!("{r:?}")).collect();
        assert_eq!(order, ["GET /b", "GET /a", "GET /c"]);
        table.clear();
        assert_eq!(table.len(), 0);
    }
}
