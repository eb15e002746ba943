//! HTTP transport and graceful shutdown.
//!
//! The router core never touches a socket. This module is the default
//! transport: hyper accepts connections, each request is decoded into a
//! [`Request`] and handed to a shared [`Dispatcher`].
//!
//! Bodies are buffered up to [`Server::max_body_size`]; anything larger is
//! answered `413` without reaching the router.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::bind::KeyValues;
use crate::dispatch::Dispatcher;
use crate::error::{BindError, Error};
use crate::request::Request;
use crate::response::Response;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Default cap on a buffered request body: 2 MiB.
const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// The HTTP server.
pub struct Server {
    addr: String,
    max_body_size: usize,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    /// Largest request body buffered before answering `413`.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, dispatcher: Arc<Dispatcher>) -> Result<(), Error> {
        self.serve_with_shutdown(dispatcher, shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(
        self,
        dispatcher: Arc<Dispatcher>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        info!(addr = %listener.local_addr()?, "trellis listening");

        let limit = self.max_body_size;

        // Every spawned connection task, so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move { handle(&dispatcher, limit, req).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set does not grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("trellis stopped");
        Ok(())
    }
}

// ── Request conversion ────────────────────────────────────────────────────────

/// Why a request never reached the dispatcher.
#[derive(Debug, Error)]
enum DecodeError {
    #[error("request body: {0}")]
    Body(Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Form(#[from] BindError),
}

/// One request in, one response out. Never fails towards hyper.
async fn handle<B>(
    dispatcher: &Dispatcher,
    limit: usize,
    req: http::Request<B>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let response = match into_request(req, limit).await {
        Ok(req) => dispatcher.dispatch(req).await,
        Err(DecodeError::Body(e)) if e.is::<LengthLimitError>() => {
            debug!(limit, "request body too large");
            Response::payload_too_large()
        }
        Err(e) => {
            debug!("unreadable request: {e}");
            Response::bad_request()
        }
    };
    Ok(response.into_inner())
}

/// Decodes the path, splits the query and collects at most `limit` body
/// bytes. A form-encoded body is also parsed into key/values; invalid UTF-8
/// in it is replaced, not dropped.
async fn into_request<B>(req: http::Request<B>, limit: usize) -> Result<Request, DecodeError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let body = Limited::new(body, limit)
        .collect()
        .await
        .map_err(DecodeError::Body)?
        .to_bytes();

    let path = decode_path(parts.uri.path());
    let query = parts.uri.query()
        .and_then(|q| KeyValues::from_urlencoded(q).ok())
        .unwrap_or_default();

    let is_form = parts.headers.get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(FORM_URLENCODED));
    let form = if is_form { KeyValues::from_urlencoded_bytes(&body)? } else { KeyValues::new() };

    Ok(Request::new(parts.method, path)
        .with_query(query)
        .with_form(form)
        .with_body(body))
}

/// `%XX` escapes to bytes; `+` is left alone, it only means space in queries.
/// Malformed escapes are kept verbatim.
fn decode_path(path: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM (Unix) or Ctrl-C.
///
/// If a handler cannot be installed that arm never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
