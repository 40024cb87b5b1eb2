//! Array executors, including the sequential and pooled variants.

use smallvec::smallvec;
use tracing::debug;

use crate::deferred::{Eventual, InFlight, Outcome, Pending};
use crate::error::{Error, Result};
use crate::value::{Function, Value};

use super::{Assembly, assemble, flatten, select};

pub(crate) fn map(items: Vec<Value>, mapper: &Function) -> Outcome {
    Ok(assemble(items, mapper)?.map(Value::Array))
}

pub(crate) fn filter(items: Vec<Value>, predicate: &Function) -> Outcome {
    Ok(select(items, |element| predicate.call1(element.clone()))?.map(Value::Array))
}

pub(crate) fn flat_map(items: Vec<Value>, flat_mapper: &Function) -> Outcome {
    assemble(items, flat_mapper)?.on_resolve(|monads| Ok(flatten::sequence(monads)?.map(Value::Array)))
}

/// Maps with `[element, index]` arguments.
pub(crate) fn map_with_index(items: Vec<Value>, mapper: &Function) -> Outcome {
    let mut assembly = Assembly::with_capacity(items.len());
    for (index, element) in items.into_iter().enumerate() {
        assembly.push(mapper.call(smallvec![element, Value::from(index)])?);
    }
    Ok(assembly.finish().map(Value::Array))
}

/// Filters with `[element, index]` arguments.
pub(crate) fn filter_with_index(items: Vec<Value>, predicate: &Function) -> Outcome {
    let selected = select(items.into_iter().enumerate(), |(index, element)| {
        predicate.call(smallvec![element.clone(), Value::from(*index)])
    })?;
    Ok(selected.map(|kept| Value::Array(kept.into_iter().map(|(_, element)| element).collect())))
}

/// Maps one element at a time, waiting for each deferred result before
/// invoking the mapper on the next element.
pub(crate) fn map_series(items: Vec<Value>, mapper: &Function) -> Outcome {
    let mut results = Vec::with_capacity(items.len());
    let mut elements = items.into_iter();
    while let Some(element) = elements.next() {
        match mapper.call1(element)? {
            Eventual::Immediate(value) => results.push(value),
            Eventual::Deferred(pending) => {
                let mapper = mapper.clone();
                return Ok(Eventual::Deferred(Pending::new(async move {
                    results.push(pending.await?);
                    for element in elements {
                        results.push(mapper.call1(element)?.resolve().await?);
                    }
                    Ok(Value::Array(results))
                })));
            }
        }
    }
    Ok(Eventual::Immediate(Value::Array(results)))
}

/// Maps with at most `limit` deferred results in flight.
///
/// # Errors
///
/// Returns [`Error::InvalidConcurrencyLimit`] when `limit` is zero.
pub(crate) fn map_pool(items: Vec<Value>, limit: usize, mapper: &Function) -> Outcome {
    if limit == 0 {
        return Err(Error::InvalidConcurrencyLimit);
    }
    let length = items.len();
    let mut results = Vec::with_capacity(length);
    let mut elements = items.into_iter().enumerate();
    while let Some((index, element)) = elements.next() {
        match mapper.call1(element)? {
            Eventual::Immediate(value) => results.push(value),
            Eventual::Deferred(pending) => {
                let mapper = mapper.clone();
                return Ok(Eventual::Deferred(Pending::new(async move {
                    let mut slots: Vec<Option<Value>> = results.into_iter().map(Some).collect();
                    slots.resize(length, None);
                    let mut in_flight = InFlight::new();
                    in_flight.admit(index, pending);
                    for (index, element) in elements {
                        while in_flight.len() >= limit {
                            debug!(limit, "pool saturated, waiting for a slot");
                            settle_into(&mut in_flight, &mut slots).await?;
                        }
                        match mapper.call1(element)? {
                            Eventual::Immediate(value) => slots[index] = Some(value),
                            Eventual::Deferred(pending) => in_flight.admit(index, pending),
                        }
                    }
                    while !in_flight.is_empty() {
                        settle_into(&mut in_flight, &mut slots).await?;
                    }
                    Ok(Value::Array(
                        slots.into_iter().map(Option::unwrap_or_default).collect(),
                    ))
                })));
            }
        }
    }
    Ok(Eventual::Immediate(Value::Array(results)))
}

async fn settle_into(in_flight: &mut InFlight, slots: &mut [Option<Value>]) -> Result<()> {
    if let Some((index, settled)) = in_flight.settle_next().await {
        slots[index] = Some(settled?);
    }
    Ok(())
}
