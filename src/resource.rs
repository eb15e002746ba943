//! Route descriptors for a group of related handlers.
//!
//! A [`Resource`] lists handlers with the patterns they answer, and is mounted
//! on a [`Router`](crate::Router) under a prefix. A handler may declare several
//! patterns; each becomes its own route, all sharing one handler.
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis::{Resource, Router};
//!
//! struct Greeter { greeting: String }
//!
//! let greeter = Arc::new(Greeter { greeting: "Hello".into() });
//! let hello = {
//!     let greeter = Arc::clone(&greeter);
//!     move || {
//!         let greeting = greeter.greeting.clone();
//!         async move { greeting }
//!     }
//! };
//!
//! let resource = Resource::new()
//!     .get_all(&["/hello", "/"], hello)
//!     .get("/bye/:whom", |whom: String| async move { format!("Good Bye {whom}") });
//!
//! let router = Router::new().mount("/say", resource).unwrap();
//! ```

use http::Method;

use crate::handler::{BoxedHandler, Handler};

pub(crate) struct Entry {
    pub(crate) method: Method,
    pub(crate) patterns: Vec<String>,
    pub(crate) handler: BoxedHandler,
}

/// A set of `(method, patterns, handler)` descriptors.
///
/// Nothing is compiled or checked until the resource is mounted.
#[derive(Default)]
pub struct Resource {
    entries: Vec<Entry>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Args>(self, pattern: &str, handler: impl Handler<Args>) -> Self {
        self.on_all(Method::GET, &[pattern], handler)
    }

    pub fn post<Args>(self, pattern: &str, handler: impl Handler<Args>) -> Self {
        self.on_all(Method::POST, &[pattern], handler)
    }

    pub fn get_all<Args>(self, patterns: &[&str], handler: impl Handler<Args>) -> Self {
        self.on_all(Method::GET, patterns, handler)
    }

    pub fn post_all<Args>(self, patterns: &[&str], handler: impl Handler<Args>) -> Self {
        self.on_all(Method::POST, patterns, handler)
    }

    pub fn on<Args>(self, method: Method, pattern: &str, handler: impl Handler<Args>) -> Self {
        self.on_all(method, &[pattern], handler)
    }

    pub fn on_all<Args>(mut self, method: Method, patterns: &[&str], handler: impl Handler<Args>) -> Self {
        self.entries.push(Entry {
            method,
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    pub(crate) fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}
