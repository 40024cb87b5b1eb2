//! Set executors. Results are collected into a new set, so mapped duplicates
//! collapse.

use crate::deferred::Outcome;
use crate::value::{Function, Value, ValueSet};

use super::{assemble, flatten, select};

fn collected(values: Vec<Value>) -> Value {
    Value::Set(values.into_iter().collect())
}

pub(crate) fn map(set: ValueSet, mapper: &Function) -> Outcome {
    Ok(assemble(set, mapper)?.map(collected))
}

pub(crate) fn filter(set: ValueSet, predicate: &Function) -> Outcome {
    let kept = select(set, |member| predicate.call1(member.clone()))?;
    Ok(kept.map(collected))
}

pub(crate) fn flat_map(set: ValueSet, flat_mapper: &Function) -> Outcome {
    assemble(set, flat_mapper)?.on_resolve(|monads| Ok(flatten::sequence(monads)?.map(collected)))
}
