//! Shared pull sequences.
//!
//! [`PullIter`] and [`PullStream`] are cheap handles to a single underlying
//! source. Cloning a handle does not fork the source: every clone pulls from
//! the same position, the way an iterator object is shared by reference.

use std::cell::RefCell;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::stream::{LocalBoxStream, Stream, StreamExt};

use crate::error::Result;

use super::Value;

type SyncSource = dyn Iterator<Item = Result<Value>>;

/// A shared synchronous pull sequence.
#[derive(Clone)]
pub struct PullIter {
    source: Rc<RefCell<Box<SyncSource>>>,
}

impl PullIter {
    /// Wraps a fallible iterator.
    pub fn new<I>(iterator: I) -> Self
    where
        I: Iterator<Item = Result<Value>> + 'static,
    {
        Self {
            source: Rc::new(RefCell::new(Box::new(iterator))),
        }
    }

    /// Wraps an infallible sequence of values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::new(values.into_iter().map(Ok))
    }

    /// Returns `true` if both handles pull from the same source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }

    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.source).cast::<()>() as usize
    }
}

impl Iterator for PullIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.borrow_mut().next()
    }
}

impl fmt::Debug for PullIter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("PullIter").finish_non_exhaustive()
    }
}

/// A shared asynchronous pull sequence.
#[derive(Clone)]
pub struct PullStream {
    source: Rc<RefCell<LocalBoxStream<'static, Result<Value>>>>,
}

impl PullStream {
    /// Wraps a fallible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value>> + 'static,
    {
        Self {
            source: Rc::new(RefCell::new(stream.boxed_local())),
        }
    }

    /// Wraps an infallible stream of values.
    pub fn from_values<S>(values: S) -> Self
    where
        S: Stream<Item = Value> + 'static,
    {
        Self::new(values.map(Ok))
    }

    /// Returns `true` if both handles pull from the same source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }

    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.source).cast::<()>() as usize
    }
}

impl Stream for PullStream {
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.source.borrow_mut().poll_next_unpin(context)
    }
}

impl fmt::Debug for PullStream {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("PullStream").finish_non_exhaustive()
    }
}
