//! Results that may be available now or later.
//!
//! Combinators never know in advance whether an operator will answer
//! synchronously. Every call therefore returns an [`Outcome`]: an error, an
//! [`Eventual::Immediate`] value, or an [`Eventual::Deferred`] one wrapped in a
//! [`Pending`] future. Executors stay on the synchronous path until the first
//! deferred result appears, and only then switch to asynchronous assembly.
//!
//! All deferred work is single threaded and lazy: a [`Pending`] does nothing
//! until it is polled, and dropping it cancels whatever it had not yet done.
//!
//! # Examples
//!
//! ```rust
//! use futures::executor::block_on;
//! use shapeflow::{Eventual, Pending, all_of};
//! use shapeflow::value::Value;
//!
//! let mixed = vec![
//!     Eventual::Immediate(Value::from(1)),
//!     Eventual::Deferred(Pending::resolved(Value::from(2))),
//! ];
//! let combined = all_of(mixed);
//! assert!(combined.is_pending());
//! assert_eq!(block_on(combined.resolve()).unwrap(), vec![Value::from(1), Value::from(2)]);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::value::Value;

/// The result of calling an operator.
pub type Outcome<T = Value> = Result<Eventual<T>>;

// =============================================================================
// Pending
// =============================================================================

/// A deferred result.
///
/// `Pending` is a boxed, single-threaded future. It is `Unpin`, so it can be
/// polled in place or raced with other pending results.
#[must_use = "pending results do nothing unless awaited"]
pub struct Pending<T = Value> {
    future: LocalBoxFuture<'static, Result<T>>,
}

impl<T: 'static> Pending<T> {
    /// Wraps a future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + 'static,
    {
        Self {
            future: future.boxed_local(),
        }
    }

    /// A pending result that settles with `value` on first poll.
    pub fn resolved(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// A pending result that fails with `error` on first poll.
    pub fn rejected(error: Error) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// Transforms the settled value.
    pub fn map<U, F>(self, function: F) -> Pending<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        Pending::new(self.future.map(|settled| settled.map(function)))
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(context)
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Pending").finish_non_exhaustive()
    }
}

// =============================================================================
// Eventual
// =============================================================================

/// A value that is either available now or deferred.
#[must_use = "eventual results carry deferred work that must be awaited"]
pub enum Eventual<T = Value> {
    /// The value is available now.
    Immediate(T),
    /// The value settles later.
    Deferred(Pending<T>),
}

impl<T: 'static> Eventual<T> {
    /// Returns `true` if the value is deferred.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Runs `continuation` on the value: synchronously if it is available,
    /// after it settles otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::{Eventual, Outcome};
    /// use shapeflow::value::Value;
    ///
    /// let doubled: Outcome = Eventual::Immediate(Value::from(2)).on_resolve(|value| {
    ///     Ok(Eventual::Immediate(Value::from(value.as_int().unwrap_or(0) * 2)))
    /// });
    /// assert_eq!(doubled.unwrap().into_immediate(), Some(Value::from(4)));
    /// ```
    pub fn on_resolve<U, F>(self, continuation: F) -> Outcome<U>
    where
        U: 'static,
        F: FnOnce(T) -> Outcome<U> + 'static,
    {
        match self {
            Self::Immediate(value) => continuation(value),
            Self::Deferred(pending) => Ok(Eventual::Deferred(Pending::new(async move {
                continuation(pending.await?)?.resolve().await
            }))),
        }
    }

    /// Transforms the value without changing when it is available.
    pub fn map<U, F>(self, function: F) -> Eventual<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        match self {
            Self::Immediate(value) => Eventual::Immediate(function(value)),
            Self::Deferred(pending) => Eventual::Deferred(pending.map(function)),
        }
    }

    /// Waits for the value.
    pub async fn resolve(self) -> Result<T> {
        match self {
            Self::Immediate(value) => Ok(value),
            Self::Deferred(pending) => pending.await,
        }
    }

    /// Converts into a [`Pending`], wrapping an available value.
    pub fn into_pending(self) -> Pending<T> {
        match self {
            Self::Immediate(value) => Pending::resolved(value),
            Self::Deferred(pending) => pending,
        }
    }

    /// Returns the value if it is available now.
    pub fn into_immediate(self) -> Option<T> {
        match self {
            Self::Immediate(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Eventual<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => formatter.debug_tuple("Immediate").field(value).finish(),
            Self::Deferred(pending) => formatter.debug_tuple("Deferred").field(pending).finish(),
        }
    }
}

// =============================================================================
// Combining
// =============================================================================

/// Combines results, staying immediate when none of them is deferred.
///
/// Fails with the first error to settle; the remaining work is dropped.
pub fn all_of<T: 'static>(items: Vec<Eventual<T>>) -> Eventual<Vec<T>> {
    if items.iter().any(Eventual::is_pending) {
        Eventual::Deferred(Pending::new(future::try_join_all(
            items.into_iter().map(Eventual::resolve),
        )))
    } else {
        Eventual::Immediate(items.into_iter().filter_map(Eventual::into_immediate).collect())
    }
}

/// Settles with the first pending result to settle, and its position.
///
/// The losers are dropped once the winner settles.
pub fn race_of<T: 'static>(pendings: Vec<Pending<T>>) -> Pending<(T, usize)> {
    Pending::new(async move {
        if pendings.is_empty() {
            return Err(Error::type_constraint(
                "race_of",
                "at least one pending result",
                Shape::Array,
            ));
        }
        let (settled, position, _) = future::select_all(pendings).await;
        settled.map(|value| (value, position))
    })
}

/// A set of tagged pending results, settled in completion order.
///
/// Executors use this to bound concurrency: admit work while below a limit,
/// and settle the next completion once the limit is reached.
pub struct InFlight<T = Value> {
    set: FuturesUnordered<LocalBoxFuture<'static, (usize, Result<T>)>>,
}

impl<T: 'static> InFlight<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            set: FuturesUnordered::new(),
        }
    }

    /// Returns the number of unsettled results.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Adds a pending result under `tag`.
    pub fn admit(&mut self, tag: usize, pending: Pending<T>) {
        self.set
            .push(async move { (tag, pending.await) }.boxed_local());
    }

    /// Waits for the next result to settle, or returns `None` if the set is
    /// empty.
    pub async fn settle_next(&mut self) -> Option<(usize, Result<T>)> {
        self.set.next().await
    }
}

impl<T: 'static> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InFlight<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InFlight")
            .field("len", &self.set.len())
            .finish()
    }
}
