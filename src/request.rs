//! Incoming request as the router sees it.

use bytes::Bytes;
use http::Method;

use crate::bind::KeyValues;

/// An incoming HTTP request, already decoded by the transport.
///
/// The path is percent-decoded; query and form values are split into
/// [`KeyValues`]. Handlers see it read-only through [`Context`](crate::Context).
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: KeyValues,
    form: KeyValues,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: KeyValues::new(),
            form: KeyValues::new(),
            body: Bytes::new(),
        }
    }

    /// Splits a request target such as `/hello?name=Dave` into path and query.
    ///
    /// A query string that does not parse is dropped.
    pub fn from_target(method: Method, target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::new(method, path)
                .with_query(KeyValues::from_urlencoded(query).unwrap_or_default()),
            None => Self::new(method, target),
        }
    }

    pub fn with_query(mut self, query: KeyValues) -> Self {
        self.query = query;
        self
    }

    pub fn with_form(mut self, form: KeyValues) -> Self {
        self.form = form;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &KeyValues { &self.query }
    pub fn form(&self) -> &KeyValues { &self.form }
    pub fn body(&self) -> &Bytes { &self.body }
}
