//! # trellis
//!
//! An embeddable HTTP request router. You give it URL patterns bound to
//! handlers and a chain of filters; for every request it decides which
//! handler runs, binds its parameters, and negotiates the response.
//!
//! ## What happens to a request
//!
//! 1. **Filters**, in registration order. The first one that answers wins.
//! 2. **Routes**, most recently registered first, static content last. The
//!    first route whose pattern and method both match runs.
//! 3. Nothing matched: `405` if some route knew the path under another
//!    method, `404` otherwise.
//! 4. The handler's return value is **negotiated**: text is `text/html`,
//!    bytes are `application/octet-stream`, structured values are
//!    `application/json`, an explicit [`Payload`] is taken as built.
//!
//! Binding failures answer `400`, handler errors and panics answer `500`
//! with a generic body. Nothing escapes [`Dispatcher::dispatch`].
//!
//! ## Patterns
//!
//! `/literal/:placeholder` segments plus an optional `?key=:name` query
//! suffix. Segment counts must line up exactly; query placeholders are
//! mandatory. Captures are bound path first, then query, left to right, and
//! the handler's parameter count is checked against them at registration.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trellis::{Dispatcher, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new()
//!         .get("/hello/:name", |name: String| async move { format!("Hello {name}") })?
//!         .get("/add/:left/:right", |left: i32, right: i32| async move { left + right })?
//!         .static_dir("site");
//!
//!     let dispatcher = Arc::new(Dispatcher::new(router));
//!     Server::bind("0.0.0.0:3000").serve(dispatcher).await?;
//!     Ok(())
//! }
//! ```

mod assets;
mod bind;
mod dispatch;
mod error;
mod filter;
mod handler;
mod observe;
mod pattern;
mod payload;
mod request;
mod resource;
mod response;
mod route;
mod router;
mod server;
mod table;

pub use assets::{StaticDir, StaticResolver};
pub use bind::{Context, Form, FromParam, KeyValues};
pub use dispatch::Dispatcher;
pub use error::{BindError, ConfigError, Error, HandlerError, Rejection};
pub use filter::Filter;
pub use handler::Handler;
pub use observe::{DispatchEvent, DispatchObserver, Outcome, TraceObserver};
pub use pattern::Pattern;
pub use payload::{ContentType, IntoPayload, Json, Payload};
pub use request::Request;
pub use resource::Resource;
pub use response::Response;
pub use router::Router;
pub use server::Server;
