//! Lazy executors over asynchronous pull sequences.
//!
//! [`MappingStream`] and [`FilteringStream`] keep source order: they hold at
//! most one deferred operator result and yield nothing else until it settles.
//!
//! [`FlatMappingStream`] *muxes*. Immediate flattened items are yielded in
//! source order, but items of asynchronous monads are yielded in completion
//! order, interleaved with whatever else is ready. At most `limit` such
//! monads are drained at once; beyond that the source is not pulled.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::future::FutureExt;
use futures::stream::{SelectAll, Stream, StreamExt};
use pin_project_lite::pin_project;
use tracing::trace;

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::{Error, Result};
use crate::value::{Function, FunctionKind, PullStream, Value};

use super::flatten::{self, Late};

/// Default bound on concurrently drained asynchronous monads.
pub const DEFAULT_FLATTEN_LIMIT: usize = 20;

pin_project! {
    /// Applies a mapper to each pulled element.
    pub struct MappingStream<S> {
        #[pin]
        source: S,
        mapper: Function,
        in_flight: Option<Pending>,
    }
}

impl<S> MappingStream<S> {
    /// Adapts `source`.
    pub const fn new(source: S, mapper: Function) -> Self {
        Self {
            source,
            mapper,
            in_flight: None,
        }
    }
}

impl<S> Stream for MappingStream<S>
where
    S: Stream<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(pending) = this.in_flight.as_mut() {
                let settled = ready!(pending.poll_unpin(context));
                *this.in_flight = None;
                return Poll::Ready(Some(settled));
            }
            let element = match ready!(this.source.as_mut().poll_next(context)) {
                None => return Poll::Ready(None),
                Some(Err(error)) => return Poll::Ready(Some(Err(error))),
                Some(Ok(element)) => element,
            };
            match this.mapper.call1(element) {
                Err(error) => return Poll::Ready(Some(Err(error))),
                Ok(Eventual::Immediate(value)) => return Poll::Ready(Some(Ok(value))),
                Ok(Eventual::Deferred(pending)) => *this.in_flight = Some(pending),
            }
        }
    }
}

pin_project! {
    /// Skips pulled elements whose predicate is falsy.
    pub struct FilteringStream<S> {
        #[pin]
        source: S,
        predicate: Function,
        held: Option<(Value, Pending)>,
    }
}

impl<S> FilteringStream<S> {
    /// Adapts `source`.
    pub const fn new(source: S, predicate: Function) -> Self {
        Self {
            source,
            predicate,
            held: None,
        }
    }
}

impl<S> Stream for FilteringStream<S>
where
    S: Stream<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some((_, verdict)) = this.held.as_mut() {
                let verdict = ready!(verdict.poll_unpin(context));
                let Some((element, _)) = this.held.take() else {
                    continue;
                };
                match verdict {
                    Err(error) => return Poll::Ready(Some(Err(error))),
                    Ok(verdict) if verdict.is_truthy() => return Poll::Ready(Some(Ok(element))),
                    Ok(_) => continue,
                }
            }
            let element = match ready!(this.source.as_mut().poll_next(context)) {
                None => return Poll::Ready(None),
                Some(Err(error)) => return Poll::Ready(Some(Err(error))),
                Some(Ok(element)) => element,
            };
            match this.predicate.call1(element.clone()) {
                Err(error) => return Poll::Ready(Some(Err(error))),
                Ok(Eventual::Immediate(verdict)) => {
                    if verdict.is_truthy() {
                        return Poll::Ready(Some(Ok(element)));
                    }
                }
                Ok(Eventual::Deferred(pending)) => *this.held = Some((element, pending)),
            }
        }
    }
}

pin_project! {
    /// Flattens each mapped element, yielding asynchronous items as they
    /// arrive.
    pub struct FlatMappingStream<S> {
        #[pin]
        source: S,
        flat_mapper: Function,
        buffer: VecDeque<Value>,
        mapping: Option<Pending>,
        flattening: SelectAll<Late>,
        source_done: bool,
        limit: usize,
    }
}

impl<S> FlatMappingStream<S> {
    /// Adapts `source` with the default flattening bound.
    pub fn new(source: S, flat_mapper: Function) -> Self {
        Self::with_limit(source, flat_mapper, DEFAULT_FLATTEN_LIMIT)
    }

    /// Bounds the number of asynchronous monads drained at once.
    pub fn with_limit(source: S, flat_mapper: Function, limit: usize) -> Self {
        Self {
            source,
            flat_mapper,
            buffer: VecDeque::new(),
            mapping: None,
            flattening: SelectAll::new(),
            source_done: false,
            limit: limit.max(1),
        }
    }
}

fn spill_into(monad: Value, buffer: &mut VecDeque<Value>, flattening: &mut SelectAll<Late>) -> Result<()> {
    let mut late = Vec::new();
    flatten::spill(monad, buffer, &mut late)?;
    if !late.is_empty() {
        trace!(arrivals = late.len(), "draining asynchronous monads");
        flattening.extend(late);
    }
    Ok(())
}

impl<S> Stream for FlatMappingStream<S>
where
    S: Stream<Item = Result<Value>>,
{
    type Item = Result<Value>;

    fn poll_next(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(value) = this.buffer.pop_front() {
                return Poll::Ready(Some(Ok(value)));
            }
            if !this.flattening.is_empty()
                && let Poll::Ready(Some(arrival)) = this.flattening.poll_next_unpin(context)
            {
                return Poll::Ready(Some(arrival));
            }
            if let Some(pending) = this.mapping.as_mut() {
                let monad = ready!(pending.poll_unpin(context));
                *this.mapping = None;
                match monad.and_then(|monad| spill_into(monad, this.buffer, this.flattening)) {
                    Ok(()) => continue,
                    Err(error) => return Poll::Ready(Some(Err(error))),
                }
            }
            if *this.source_done || this.flattening.len() >= *this.limit {
                if this.flattening.is_empty() {
                    return Poll::Ready(None);
                }
                trace!(in_flight = this.flattening.len(), "parked on in-flight flattening");
                return Poll::Pending;
            }
            match ready!(this.source.as_mut().poll_next(context)) {
                None => *this.source_done = true,
                Some(Err(error)) => return Poll::Ready(Some(Err(error))),
                Some(Ok(element)) => match this.flat_mapper.call1(element) {
                    Err(error) => return Poll::Ready(Some(Err(error))),
                    Ok(Eventual::Immediate(monad)) => {
                        if let Err(error) = spill_into(monad, this.buffer, this.flattening) {
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                    Ok(Eventual::Deferred(pending)) => *this.mapping = Some(pending),
                },
            }
        }
    }
}

/// Wraps an async generator function so each call's sequence is adapted by
/// `adapt`.
pub(crate) fn wrap_async_generator<F>(generator: Function, adapt: F) -> Function
where
    F: Fn(PullStream) -> PullStream + 'static,
{
    let adapt = std::rc::Rc::new(adapt);
    Function::with_kind(FunctionKind::AsyncGenerator, move |args| {
        let adapt = std::rc::Rc::clone(&adapt);
        generator.call(args)?.on_resolve(move |produced| rewrap(produced, &*adapt))
    })
}

fn rewrap<F>(produced: Value, adapt: &F) -> Outcome
where
    F: Fn(PullStream) -> PullStream + ?Sized,
{
    match produced {
        Value::Stream(stream) => Ok(Eventual::Immediate(Value::Stream(adapt(stream)))),
        other => Err(Error::type_constraint(
            "async generator",
            "an asynchronous pull sequence",
            other.shape(),
        )),
    }
}
