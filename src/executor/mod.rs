//! Per-shape executors.
//!
//! Each submodule implements map, filter and flat-map for one shape. They all
//! share the same discipline: operators are invoked synchronously, in element
//! order, and results are assembled eagerly until the first deferred result
//! appears. From then on the remaining results are collected as [`Eventual`]s
//! and combined once, so order is preserved no matter which deferred result
//! settles first.

pub mod array;
pub mod bytes;
pub mod flatten;
pub mod iter;
pub mod mapping;
pub mod object;
pub mod set;
pub mod stream;
pub mod text;

use tracing::trace;

use crate::deferred::{Eventual, Outcome, Pending, all_of};
use crate::value::{Function, Value};

/// Collects results, eagerly until the first deferred one.
pub(crate) enum Assembly<T = Value> {
    Eager(Vec<T>),
    Deferred(Vec<Eventual<T>>),
}

impl<T: 'static> Assembly<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::Eager(Vec::with_capacity(capacity))
    }

    pub(crate) fn push(&mut self, item: Eventual<T>) {
        match self {
            Self::Eager(settled) => match item {
                Eventual::Immediate(value) => settled.push(value),
                Eventual::Deferred(pending) => {
                    trace!(settled = settled.len(), "switching to deferred assembly");
                    let mut items: Vec<Eventual<T>> = std::mem::take(settled)
                        .into_iter()
                        .map(Eventual::Immediate)
                        .collect();
                    items.push(Eventual::Deferred(pending));
                    *self = Self::Deferred(items);
                }
            },
            Self::Deferred(items) => items.push(item),
        }
    }

    pub(crate) fn finish(self) -> Eventual<Vec<T>> {
        match self {
            Self::Eager(settled) => Eventual::Immediate(settled),
            Self::Deferred(items) => all_of(items),
        }
    }
}

/// Invokes `mapper` on every element and assembles the results in order.
pub(crate) fn assemble<I>(elements: I, mapper: &Function) -> Outcome<Vec<Value>>
where
    I: IntoIterator<Item = Value>,
{
    let elements = elements.into_iter();
    let mut assembly = Assembly::with_capacity(elements.size_hint().0);
    for element in elements {
        assembly.push(mapper.call1(element)?);
    }
    Ok(assembly.finish())
}

/// Keeps the items whose verdict is truthy, in order.
///
/// Verdicts are requested for every item before any deferred one is
/// awaited.
pub(crate) fn select<T, I, V>(items: I, mut verdict_of: V) -> Outcome<Vec<T>>
where
    T: 'static,
    I: IntoIterator<Item = T>,
    V: FnMut(&T) -> Outcome,
{
    let mut items = items.into_iter();
    let mut kept = Vec::new();
    while let Some(item) = items.next() {
        match verdict_of(&item)? {
            Eventual::Immediate(verdict) => {
                if verdict.is_truthy() {
                    kept.push(item);
                }
            }
            Eventual::Deferred(pending) => {
                trace!(kept = kept.len(), "switching to deferred selection");
                let mut candidates = vec![item];
                let mut verdicts = vec![Eventual::Deferred(pending)];
                for item in items {
                    verdicts.push(verdict_of(&item)?);
                    candidates.push(item);
                }
                return Ok(Eventual::Deferred(Pending::new(async move {
                    let verdicts = all_of(verdicts).resolve().await?;
                    kept.extend(
                        candidates
                            .into_iter()
                            .zip(verdicts)
                            .filter_map(|(candidate, verdict)| verdict.is_truthy().then_some(candidate)),
                    );
                    Ok(kept)
                })));
            }
        }
    }
    Ok(Eventual::Immediate(kept))
}

/// Resolves an operator result that must not be deferred.
pub(crate) fn settle_now(outcome: Outcome, combinator: &'static str) -> crate::Result<Value> {
    match outcome? {
        Eventual::Immediate(value) => Ok(value),
        Eventual::Deferred(_) => Err(crate::Error::DeferredInSyncSequence { combinator }),
    }
}
