//! What handlers return, and the [`IntoPayload`] conversion trait.
//!
//! A handler returns anything that implements [`IntoPayload`]. The shape of
//! the value decides the representation:
//!
//! | Return type | Status | Content-Type |
//! |---|---|---|
//! | [`Payload`] | as built | as built |
//! | `String`, `&'static str` | 200 | `text/html` |
//! | `Vec<u8>`, `Bytes`, `&'static [u8]` | 200 | `application/octet-stream` |
//! | [`Json<T>`], `serde_json::Value`, numbers, `bool` | 200 | `application/json` |
//! | [`StatusCode`] | that code | `text/html`, empty body |
//! | `Result<T, E>` | `T`'s, or 500 on `Err` | |

use std::error::Error as StdError;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, InvalidHeaderValue, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use tokio::io::AsyncRead;

use crate::error::HandlerError;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types the router produces on its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Gif,          // image/gif
    Html,         // text/html
    Icon,         // image/x-icon
    Javascript,   // application/javascript
    Jpeg,         // image/jpeg
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html",
            Self::Icon        => "image/x-icon",
            Self::Javascript  => "application/javascript",
            Self::Jpeg        => "image/jpeg",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain",
        }
    }

    /// Guesses from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css"                     => Self::Css,
            "gif"                     => Self::Gif,
            "htm" | "html"            => Self::Html,
            "ico"                     => Self::Icon,
            "js" | "mjs"              => Self::Javascript,
            "jpg" | "jpeg"            => Self::Jpeg,
            "json" | "map"            => Self::Json,
            "png"                     => Self::Png,
            "svg"                     => Self::Svg,
            "txt" | "md" | "markdown" => Self::Text,
            _                         => Self::OctetStream,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

pub(crate) type BoxReader = Pin<Box<dyn AsyncRead + Send + 'static>>;

pub(crate) enum Body {
    Bytes(Bytes),
    Stream(BoxReader),
    Json(serde_json::Value),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b)  => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Json(v)   => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

/// An explicit response representation built by a handler or a filter.
///
/// ```rust
/// use http::StatusCode;
/// use trellis::Payload;
///
/// Payload::new("text/plain", "TEXT");
/// Payload::status(StatusCode::NO_CONTENT);
/// Payload::see_other("/login").unwrap();
/// Payload::new("text/html", "<p>gone</p>").with_status(StatusCode::GONE);
/// ```
#[derive(Debug)]
pub struct Payload {
    pub(crate) status: StatusCode,
    pub(crate) content_type: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Body,
}

impl Payload {
    /// `200 OK` with the given content type and bytes.
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::with_body(content_type.into(), Body::Bytes(body.into()))
    }

    /// `200 OK` whose body is piped from `reader` when the response is built.
    pub fn stream(content_type: impl Into<String>, reader: impl AsyncRead + Send + 'static) -> Self {
        Self::with_body(content_type.into(), Body::Stream(Box::pin(reader)))
    }

    /// `200 OK`, `application/json`.
    pub fn json(value: serde_json::Value) -> Self {
        Self::with_body(ContentType::Json.as_str().to_owned(), Body::Json(value))
    }

    /// `200 OK`, `text/html`.
    pub fn html(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::new(ContentType::Html.as_str(), body)
    }

    /// `200 OK`, `application/octet-stream`.
    pub fn bytes(body: impl Into<Bytes>) -> Self {
        Self::new(ContentType::OctetStream.as_str(), body)
    }

    /// Status only, empty `text/html` body.
    pub fn status(code: StatusCode) -> Self {
        Self::html(String::new()).with_status(code)
    }

    /// `303 See Other` pointing at `location`.
    pub fn see_other(location: &str) -> Result<Self, InvalidHeaderValue> {
        let location = HeaderValue::from_str(location)?;
        Ok(Self::status(StatusCode::SEE_OTHER).with_header(LOCATION, location))
    }

    pub fn with_status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    fn with_body(content_type: String, body: Body) -> Self {
        Self { status: StatusCode::OK, content_type, headers: HeaderMap::new(), body }
    }
}

// ── Json ──────────────────────────────────────────────────────────────────────

/// Serialises any `T: Serialize` as `application/json`.
///
/// ```rust
/// use serde::Serialize;
/// use trellis::Json;
///
/// #[derive(Serialize)]
/// struct Person { name: String, age: u32 }
///
/// async fn person() -> Json<Person> {
///     Json(Person { name: "NAME".into(), age: 42 })
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

// ── IntoPayload ───────────────────────────────────────────────────────────────

/// Conversion of a handler's return value into a [`Payload`].
///
/// `Err` means the handler failed and is answered with `500`.
pub trait IntoPayload {
    fn into_payload(self) -> Result<Payload, HandlerError>;
}

impl IntoPayload for Payload {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(self) }
}

impl IntoPayload for String {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::html(self)) }
}

impl IntoPayload for &'static str {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::html(self)) }
}

impl IntoPayload for Vec<u8> {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::bytes(self)) }
}

impl IntoPayload for Bytes {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::bytes(self)) }
}

impl IntoPayload for &'static [u8] {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::bytes(self)) }
}

impl IntoPayload for StatusCode {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::status(self)) }
}

impl IntoPayload for serde_json::Value {
    fn into_payload(self) -> Result<Payload, HandlerError> { Ok(Payload::json(self)) }
}

impl<T: Serialize> IntoPayload for Json<T> {
    fn into_payload(self) -> Result<Payload, HandlerError> {
        serde_json::to_value(&self.0)
            .map(Payload::json)
            .map_err(HandlerError::new)
    }
}

macro_rules! json_scalar_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPayload for $ty {
                fn into_payload(self) -> Result<Payload, HandlerError> {
                    Ok(Payload::json(serde_json::Value::from(self)))
                }
            }
        )*
    };
}

json_scalar_payload!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);

impl<T, E> IntoPayload for Result<T, E>
where
    T: IntoPayload,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn into_payload(self) -> Result<Payload, HandlerError> {
        self.map_err(HandlerError::new)?.into_payload()
    }
}
