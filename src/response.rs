//! Outgoing response and content negotiation.
//!
//! [`negotiate`] turns a [`Payload`] into the final [`Response`]: streams are
//! drained, structured values are serialised. The framework's own answers
//! (404, 405, 400, 413, 500) are built here too, always as `text/html`.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tokio::io::AsyncReadExt;
use tracing::error;

use crate::payload::{Body, ContentType, Payload};

const NOT_FOUND: &str = "Page not found";
const METHOD_NOT_ALLOWED: &str = "Method not allowed";
const BAD_REQUEST: &str = "Bad request";
const PAYLOAD_TOO_LARGE: &str = "Payload too large";
const SERVER_ERROR: &str = "An error occurred on the server";

/// A fully materialised HTTP response, ready for the transport.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    content_type: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn status(&self) -> StatusCode { self.status }
    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Body as UTF-8 text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub(crate) fn not_found() -> Self {
        Self::html(StatusCode::NOT_FOUND, NOT_FOUND)
    }

    pub(crate) fn method_not_allowed() -> Self {
        Self::html(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
    }

    pub(crate) fn bad_request() -> Self {
        Self::html(StatusCode::BAD_REQUEST, BAD_REQUEST)
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::html(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE)
    }

    pub(crate) fn server_error() -> Self {
        Self::html(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
    }

    fn html(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            content_type: ContentType::Html.as_str().to_owned(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    /// Converts into the `http` crate's response type for hyper.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        match HeaderValue::from_str(&self.content_type) {
            Ok(value) => {
                res.headers_mut().insert(CONTENT_TYPE, value);
            }
            Err(e) => error!(content_type = %self.content_type, "dropping invalid content-type: {e}"),
        }
        res
    }
}

/// Materialises a payload.
///
/// A stream that fails mid-read cannot be answered partially, so it becomes
/// a `500`.
pub(crate) async fn negotiate(payload: Payload) -> Response {
    let Payload { status, content_type, headers, body } = payload;

    let body = match body {
        Body::Bytes(bytes) => bytes,
        Body::Json(value) => match serde_json::to_vec(&value) {
            Ok(vec) => Bytes::from(vec),
            Err(e) => {
                error!("json serialisation failed: {e}");
                return Response::server_error();
            }
        },
        Body::Stream(mut reader) => {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf).await {
                error!("payload stream failed: {e}");
                return Response::server_error();
            }
            Bytes::from(buf)
        }
    };

    Response { status, content_type, headers, body }
}
