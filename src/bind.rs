//! Parameter binding: captured strings to typed handler arguments.
//!
//! A handler takes one of four shapes:
//!
//! | Parameters | Receives |
//! |---|---|
//! | zero to four `T: FromParam` | captured values, left to right |
//! | one [`KeyValues`] | the form body on POST, the query string otherwise |
//! | one [`Form<T>`] | the form body deserialised into `T` (POST only) |
//! | one [`Context`] | the whole request, read-only |
//!
//! Only the first shape consumes captures, so the other three are registered
//! on patterns without placeholders.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::BindError;
use crate::request::Request;

// ── FromParam ─────────────────────────────────────────────────────────────────

/// A type a single captured value can be bound to.
pub trait FromParam: Sized {
    fn from_param(raw: &str) -> Result<Self, BindError>;
}

impl FromParam for String {
    fn from_param(raw: &str) -> Result<Self, BindError> {
        Ok(raw.to_owned())
    }
}

macro_rules! from_str_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromParam for $ty {
                fn from_param(raw: &str) -> Result<Self, BindError> {
                    raw.parse().map_err(|_| BindError::InvalidValue {
                        value: raw.to_owned(),
                        ty: stringify!($ty),
                    })
                }
            }
        )*
    };
}

from_str_param!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool);

// ── KeyValues ─────────────────────────────────────────────────────────────────

/// Ordered key/value pairs from a query string or a form body.
///
/// Keys may repeat; [`get`](KeyValues::get) returns the first occurrence.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeyValues {
    pairs: Vec<(String, String)>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` text.
    pub fn from_urlencoded(input: &str) -> Result<Self, BindError> {
        serde_urlencoded::from_str(input)
            .map(|pairs| Self { pairs })
            .map_err(|e| BindError::Form(e.to_string()))
    }

    /// Parses a form body. Invalid UTF-8 is replaced with `U+FFFD`.
    pub fn from_urlencoded_bytes(input: &[u8]) -> Result<Self, BindError> {
        serde_urlencoded::from_bytes(input)
            .map(|pairs| Self { pairs })
            .map_err(|e| BindError::Form(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    /// Deserialises the pairs into a record, converting values the way a
    /// form decoder would (`"42"` into an integer field and so on).
    pub(crate) fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let encoded = serde_urlencoded::to_string(&self.pairs)
            .map_err(|e| BindError::Form(e.to_string()))?;
        serde_urlencoded::from_str(&encoded).map_err(|e| BindError::Form(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl fmt::Display for KeyValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

// ── Form ──────────────────────────────────────────────────────────────────────

/// A form body bound field by field into a record.
///
/// Keys without a matching field are ignored. Fields without a key need
/// `#[serde(default)]`, otherwise binding fails with `400 Bad Request`.
///
/// ```rust
/// use serde::Deserialize;
/// use trellis::Form;
///
/// #[derive(Default, Deserialize)]
/// #[serde(default)]
/// struct Human {
///     first_name: String,
///     last_name: String,
/// }
///
/// async fn create(Form(human): Form<Human>) -> String {
///     format!("CREATED {} {}", human.first_name, human.last_name)
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Form<T>(pub T);

impl<T> Form<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Form<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Read-only view of the request for handlers that want all of it.
#[derive(Clone, Debug)]
pub struct Context {
    req: Arc<Request>,
}

impl Context {
    pub(crate) fn new(req: Arc<Request>) -> Self {
        Self { req }
    }

    pub fn method(&self) -> &Method { self.req.method() }
    pub fn path(&self) -> &str { self.req.path() }
    pub fn query(&self, key: &str) -> Option<&str> { self.req.query().get(key) }
    pub fn form(&self, key: &str) -> Option<&str> { self.req.form().get(key) }
    pub fn body(&self) -> &Bytes { self.req.body() }

    /// Form value first, then query value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.form(key).or_else(|| self.query(key))
    }

    /// The key/value set a [`KeyValues`] handler would receive.
    pub fn key_values(&self) -> &KeyValues {
        key_values_for(&self.req)
    }
}

pub(crate) fn key_values_for(req: &Request) -> &KeyValues {
    if req.method() == Method::POST {
        req.form()
    } else {
        req.query()
    }
}
