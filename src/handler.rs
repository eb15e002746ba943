//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A route table holds handlers of many different types, so every handler is
//! erased behind one interface: "take the request and the ordered captured
//! values, produce a payload". The typed signature the user wrote survives
//! only as an arity, checked once when the route is registered.
//!
//! ```text
//! async fn add(left: i32, right: i32) -> i32 { … }   ← user writes this
//!        ↓ router.get("/add/:left/:right", add)
//! add.into_boxed_handler()                           ← Handler blanket impl
//!        ↓
//! Arc::new(Positional { f: add, .. })                ← arity 2
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, vec!["22", "20"])  per request   ← bind, then call
//!        ↓
//! Box::pin(async { add(22, 20).await.into_payload() })
//! ```
//!
//! The `Args` type parameter of [`Handler`] only exists to keep the blanket
//! impls apart; callers never name it.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::bind::{Context, Form, FromParam, KeyValues, key_values_for};
use crate::error::{BindError, Rejection};
use crate::payload::{IntoPayload, Payload};
use crate::request::Request;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a handler invocation resolves to.
pub(crate) type Invocation = BoxFuture<Result<Payload, Rejection>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// `Handler` trait.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync + 'static {
    /// Number of captured values this handler binds.
    fn arity(&self) -> usize;

    /// Whether the handler binds a form record, which only POST carries.
    fn binds_form(&self) -> bool {
        false
    }

    fn call(&self, req: Arc<Request>, captures: Vec<String>) -> Invocation;
}

/// A type-erased handler, shared by every route registered for it.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` or
/// closure returning a future, whose output implements
/// [`IntoPayload`], with one of these parameter lists:
///
/// ```text
/// ()                       (a: A)          (a: A, b: B)   … up to four, A..D: FromParam
/// (kv: KeyValues)          (form: Form<T>)                (ctx: Context)
/// ```
///
/// The trait is sealed: only the blanket impls below can satisfy it.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

/// Marker for handlers bound positionally from captures.
#[doc(hidden)]
pub struct Positional<T>(PhantomData<fn() -> T>);

/// Marker for handlers taking a [`KeyValues`].
#[doc(hidden)]
pub struct WithKeyValues;

/// Marker for handlers taking a [`Form<T>`].
#[doc(hidden)]
pub struct WithForm<T>(PhantomData<fn() -> T>);

/// Marker for handlers taking a [`Context`].
#[doc(hidden)]
pub struct WithContext;

fn invoke<Fut, R>(fut: Fut) -> Invocation
where
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload,
{
    Box::pin(async move { fut.await.into_payload().map_err(Rejection::from) })
}

fn reject(err: BindError) -> Invocation {
    Box::pin(async move { Err(Rejection::Binding(err)) })
}

// ── Positional handlers ───────────────────────────────────────────────────────

/// Holds a concrete handler `F` together with the argument tuple it binds.
struct PositionalHandler<F, T> {
    f: F,
    _args: PhantomData<fn() -> T>,
}

macro_rules! positional_handler {
    ($arity:expr $(, $ty:ident)*) => {
        impl<F, Fut, R, $($ty,)*> private::Sealed<Positional<($($ty,)*)>> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoPayload + 'static,
            $($ty: FromParam + 'static,)*
        {
        }

        impl<F, Fut, R, $($ty,)*> Handler<Positional<($($ty,)*)>> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoPayload + 'static,
            $($ty: FromParam + 'static,)*
        {
            fn into_boxed_handler(self) -> BoxedHandler {
                Arc::new(PositionalHandler::<F, ($($ty,)*)> { f: self, _args: PhantomData })
            }
        }

        impl<F, Fut, R, $($ty,)*> ErasedHandler for PositionalHandler<F, ($($ty,)*)>
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoPayload + 'static,
            $($ty: FromParam + 'static,)*
        {
            fn arity(&self) -> usize {
                $arity
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, _req: Arc<Request>, captures: Vec<String>) -> Invocation {
                let mut values = captures.iter();
                let mut index = 0;
                $(
                    let $ty = match values.next() {
                        Some(raw) => match <$ty as FromParam>::from_param(raw) {
                            Ok(value) => value,
                            Err(e) => return reject(e),
                        },
                        None => return reject(BindError::Missing { index }),
                    };
                    index += 1;
                )*
                invoke((self.f)($($ty),*))
            }
        }
    };
}

positional_handler!(0);
positional_handler!(1, A);
positional_handler!(2, A, B);
positional_handler!(3, A, B, C);
positional_handler!(4, A, B, C, D);

// ── Whole-request handlers ────────────────────────────────────────────────────

struct KeyValuesHandler<F>(F);

impl<F, Fut, R> private::Sealed<WithKeyValues> for F
where
    F: Fn(KeyValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
}

impl<F, Fut, R> Handler<WithKeyValues> for F
where
    F: Fn(KeyValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(KeyValuesHandler(self))
    }
}

impl<F, Fut, R> ErasedHandler for KeyValuesHandler<F>
where
    F: Fn(KeyValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
    fn arity(&self) -> usize {
        0
    }

    fn call(&self, req: Arc<Request>, _captures: Vec<String>) -> Invocation {
        invoke((self.0)(key_values_for(&req).clone()))
    }
}

struct FormHandler<F, T> {
    f: F,
    _record: PhantomData<fn() -> T>,
}

impl<F, Fut, R, T> private::Sealed<WithForm<T>> for F
where
    F: Fn(Form<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
    T: DeserializeOwned + 'static,
{
}

impl<F, Fut, R, T> Handler<WithForm<T>> for F
where
    F: Fn(Form<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
    T: DeserializeOwned + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FormHandler { f: self, _record: PhantomData })
    }
}

impl<F, Fut, R, T> ErasedHandler for FormHandler<F, T>
where
    F: Fn(Form<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
    T: DeserializeOwned + 'static,
{
    fn arity(&self) -> usize {
        0
    }

    fn binds_form(&self) -> bool {
        true
    }

    fn call(&self, req: Arc<Request>, _captures: Vec<String>) -> Invocation {
        match req.form().deserialize::<T>() {
            Ok(record) => invoke((self.f)(Form(record))),
            Err(e) => reject(e),
        }
    }
}

struct ContextHandler<F>(F);

impl<F, Fut, R> private::Sealed<WithContext> for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
}

impl<F, Fut, R> Handler<WithContext> for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(ContextHandler(self))
    }
}

impl<F, Fut, R> ErasedHandler for ContextHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoPayload + 'static,
{
    fn arity(&self) -> usize {
        0
    }

    fn call(&self, req: Arc<Request>, _captures: Vec<String>) -> Invocation {
        invoke((self.0)(Context::new(req)))
    }
}
