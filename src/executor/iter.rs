//! Lazy executors over synchronous pull sequences.
//!
//! Each adapter pulls one source element per request and applies its
//! operator on the spot. A synchronous sequence cannot wait, so an operator
//! that defers yields [`Error::DeferredInSyncSequence`] for that element.
//!
//! [`Error::DeferredInSyncSequence`]: crate::Error::DeferredInSyncSequence

use std::collections::VecDeque;

use crate::deferred::{Eventual, Outcome};
use crate::error::{Error, Result};
use crate::value::{Function, FunctionKind, PullIter, Value};

use super::{flatten, settle_now};

/// Applies a mapper to each pulled element.
pub struct MappingIter<I> {
    source: I,
    mapper: Function,
}

impl<I> MappingIter<I> {
    /// Adapts `source`.
    pub const fn new(source: I, mapper: Function) -> Self {
        Self { source, mapper }
    }
}

impl<I> Iterator for MappingIter<I>
where
    I: Iterator<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = match self.source.next()? {
            Ok(element) => element,
            Err(error) => return Some(Err(error)),
        };
        Some(settle_now(self.mapper.call1(element), "map"))
    }
}

/// Skips pulled elements whose predicate is falsy.
pub struct FilteringIter<I> {
    source: I,
    predicate: Function,
}

impl<I> FilteringIter<I> {
    /// Adapts `source`.
    pub const fn new(source: I, predicate: Function) -> Self {
        Self { source, predicate }
    }
}

impl<I> Iterator for FilteringIter<I>
where
    I: Iterator<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = match self.source.next()? {
                Ok(element) => element,
                Err(error) => return Some(Err(error)),
            };
            match settle_now(self.predicate.call1(element.clone()), "filter") {
                Ok(verdict) if verdict.is_truthy() => return Some(Ok(element)),
                Ok(_) => {}
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Flattens each mapped element into a buffer that is drained before the
/// next source element is pulled.
pub struct FlatMappingIter<I> {
    source: I,
    flat_mapper: Function,
    buffer: VecDeque<Value>,
}

impl<I> FlatMappingIter<I> {
    /// Adapts `source`.
    pub const fn new(source: I, flat_mapper: Function) -> Self {
        Self {
            source,
            flat_mapper,
            buffer: VecDeque::new(),
        }
    }

    fn refill(&mut self, element: Value) -> Result<()> {
        let monad = settle_now(self.flat_mapper.call1(element), "flat_map")?;
        let mut late = Vec::new();
        flatten::spill(monad, &mut self.buffer, &mut late)?;
        if late.is_empty() {
            Ok(())
        } else {
            Err(Error::DeferredInSyncSequence {
                combinator: "flat_map",
            })
        }
    }
}

impl<I> Iterator for FlatMappingIter<I>
where
    I: Iterator<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.buffer.pop_front() {
                return Some(Ok(value));
            }
            let element = match self.source.next()? {
                Ok(element) => element,
                Err(error) => return Some(Err(error)),
            };
            if let Err(error) = self.refill(element) {
                return Some(Err(error));
            }
        }
    }
}

/// Wraps a generator function so each call's sequence is adapted by `adapt`.
pub(crate) fn wrap_generator<F>(generator: Function, adapt: F) -> Function
where
    F: Fn(PullIter) -> PullIter + 'static,
{
    Function::with_kind(FunctionKind::Generator, move |args| {
        let produced = generator.call(args)?;
        rewrap(produced, &adapt)
    })
}

fn rewrap<F>(produced: Eventual, adapt: &F) -> Outcome
where
    F: Fn(PullIter) -> PullIter,
{
    match produced {
        Eventual::Immediate(Value::Iter(iter)) => Ok(Eventual::Immediate(Value::Iter(adapt(iter)))),
        Eventual::Immediate(other) => Err(Error::type_constraint(
            "generator",
            "a synchronous pull sequence",
            other.shape(),
        )),
        Eventual::Deferred(_) => Err(Error::DeferredInSyncSequence {
            combinator: "generator",
        }),
    }
}
