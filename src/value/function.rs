//! Callables carried by [`Value::Function`].
//!
//! A [`Function`] is a reference-counted body from positional arguments to an
//! [`Outcome`]. Its [`FunctionKind`] distinguishes plain callables from
//! generator functions, whose calls produce pull sequences. The kind decides
//! how combinators treat a callable: a plain callable in collection position
//! is a reducer, a generator function is a lazy source.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::Stream;
use smallvec::{SmallVec, smallvec};

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::Result;

use super::{PullIter, PullStream, Value};

/// Positional call arguments.
pub type Args = SmallVec<[Value; 2]>;

type Body = dyn Fn(Args) -> Outcome;

/// What a call to a [`Function`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// An ordinary callable.
    Plain,
    /// A callable whose calls produce synchronous pull sequences.
    Generator,
    /// A callable whose calls produce asynchronous pull sequences.
    AsyncGenerator,
}

/// A shared callable from positional arguments to an [`Outcome`].
///
/// # Examples
///
/// ```rust
/// use shapeflow::value::{Function, Value};
///
/// let add = Function::binary(|left: Value, right: Value| {
///     Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0))
/// });
/// let sum = add.call2(Value::from(1), Value::from(2)).unwrap();
/// assert_eq!(sum.into_immediate(), Some(Value::from(3)));
/// ```
#[derive(Clone)]
pub struct Function {
    kind: FunctionKind,
    body: Rc<Body>,
}

fn first(args: Args) -> Value {
    args.into_iter().next().unwrap_or_default()
}

fn first_two(args: Args) -> (Value, Value) {
    let mut args = args.into_iter();
    let left = args.next().unwrap_or_default();
    let right = args.next().unwrap_or_default();
    (left, right)
}

impl Function {
    /// Creates a plain callable over all positional arguments.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Args) -> Outcome + 'static,
    {
        Self::with_kind(FunctionKind::Plain, body)
    }

    pub(crate) fn with_kind<F>(kind: FunctionKind, body: F) -> Self
    where
        F: Fn(Args) -> Outcome + 'static,
    {
        Self {
            kind,
            body: Rc::new(body),
        }
    }

    /// Creates a callable over its first argument that may fail or defer.
    pub fn operator<F>(body: F) -> Self
    where
        F: Fn(Value) -> Outcome + 'static,
    {
        Self::new(move |args| body(first(args)))
    }

    /// Creates an infallible synchronous callable over its first argument.
    pub fn unary<F>(body: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        Self::operator(move |value| Ok(Eventual::Immediate(body(value))))
    }

    /// Creates a synchronous callable over its first argument that may fail.
    pub fn fallible<F>(body: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + 'static,
    {
        Self::operator(move |value| body(value).map(Eventual::Immediate))
    }

    /// Creates a callable over its first argument that always defers.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use shapeflow::value::{Function, Value};
    ///
    /// let delayed = Function::deferred(|value: Value| async move {
    ///     tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    ///     Ok(value)
    /// });
    /// let value = delayed.call1(Value::from(1))?.resolve().await?;
    /// ```
    pub fn deferred<F, Fut>(body: F) -> Self
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = Result<Value>> + 'static,
    {
        Self::operator(move |value| Ok(Eventual::Deferred(Pending::new(body(value)))))
    }

    /// Creates a callable over its first two arguments that may fail or defer.
    pub fn reducer<F>(body: F) -> Self
    where
        F: Fn(Value, Value) -> Outcome + 'static,
    {
        Self::new(move |args| {
            let (left, right) = first_two(args);
            body(left, right)
        })
    }

    /// Creates an infallible synchronous callable over its first two arguments.
    pub fn binary<F>(body: F) -> Self
    where
        F: Fn(Value, Value) -> Value + 'static,
    {
        Self::reducer(move |left, right| Ok(Eventual::Immediate(body(left, right))))
    }

    /// Creates a callable over its first two arguments that always defers.
    pub fn binary_deferred<F, Fut>(body: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + 'static,
        Fut: Future<Output = Result<Value>> + 'static,
    {
        Self::reducer(move |left, right| Ok(Eventual::Deferred(Pending::new(body(left, right)))))
    }

    /// Creates a generator function: every call produces a fresh synchronous
    /// pull sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::value::{Function, Value};
    ///
    /// let numbers = Function::generator(|_| (1..=3).map(Value::from));
    /// let Some(Value::Iter(iter)) = numbers.call(Default::default()).unwrap().into_immediate() else {
    ///     unreachable!()
    /// };
    /// assert_eq!(iter.map(Result::unwrap).collect::<Vec<_>>(), vec![
    ///     Value::from(1),
    ///     Value::from(2),
    ///     Value::from(3),
    /// ]);
    /// ```
    pub fn generator<F, I>(body: F) -> Self
    where
        F: Fn(Args) -> I + 'static,
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::with_kind(FunctionKind::Generator, move |args| {
            Ok(Eventual::Immediate(Value::Iter(PullIter::from_values(body(args)))))
        })
    }

    /// Creates an async generator function: every call produces a fresh
    /// asynchronous pull sequence.
    pub fn async_generator<F, S>(body: F) -> Self
    where
        F: Fn(Args) -> S + 'static,
        S: Stream<Item = Value> + 'static,
    {
        Self::with_kind(FunctionKind::AsyncGenerator, move |args| {
            Ok(Eventual::Immediate(Value::Stream(PullStream::from_values(body(args)))))
        })
    }

    /// Returns what calls to this function produce.
    #[inline]
    pub const fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Returns `true` for an ordinary callable.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.kind == FunctionKind::Plain
    }

    /// Calls the function with positional arguments.
    #[inline]
    pub fn call(&self, args: Args) -> Outcome {
        (self.body)(args)
    }

    /// Calls the function with a single argument.
    #[inline]
    pub fn call1(&self, argument: Value) -> Outcome {
        self.call(smallvec![argument])
    }

    /// Calls the function with two arguments.
    #[inline]
    pub fn call2(&self, first: Value, second: Value) -> Outcome {
        self.call(smallvec![first, second])
    }

    /// Returns `true` if both handles share the same body.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.body), Rc::as_ptr(&other.body))
    }

    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.body).cast::<()>() as usize
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Function")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
