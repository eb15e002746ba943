//! Error types.
//!
//! Two families. Configuration errors come back from the registration call
//! that caused them, before a single request is served. Request-time failures
//! never escape [`Dispatcher::dispatch`](crate::Dispatcher::dispatch): they
//! are turned into a status code there.

use std::error::Error as StdError;

use thiserror::Error;

/// A route could not be registered.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The handler binds a different number of values than the pattern captures.
    #[error("expected {expected} parameters in `{pattern}`, handler takes {found}")]
    ArityMismatch {
        pattern: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// A [`Form`](crate::Form) handler was registered for a method without a form body.
    #[error("`{method} {pattern}`: form records can only be bound on POST")]
    FormRequiresPost { method: http::Method, pattern: String },
}

/// A captured value could not be converted into the handler's parameter type.
///
/// Answered with `400 Bad Request`.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("cannot bind `{value}` as {ty}")]
    InvalidValue { value: String, ty: &'static str },

    #[error("missing value for parameter {index}")]
    Missing { index: usize },

    #[error("invalid form body: {0}")]
    Form(String),
}

/// A handler failed at request time. The detail is logged, never sent.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(Box<dyn StdError + Send + Sync>);

impl HandlerError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Why a matched route did not produce a payload.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Binding(#[from] BindError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Transport failure: binding to a port or accepting a connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
