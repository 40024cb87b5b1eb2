//! Mapping executors. Operators see values only; keys are carried over.

use crate::deferred::Outcome;
use crate::value::{Function, Value, ValueMap};

use super::{assemble, flatten, select};

pub(crate) fn map(map: ValueMap, mapper: &Function) -> Outcome {
    let (keys, values): (Vec<Value>, Vec<Value>) = map.into_iter().unzip();
    Ok(assemble(values, mapper)?.map(move |results| Value::Map(keys.into_iter().zip(results).collect())))
}

pub(crate) fn filter(map: ValueMap, predicate: &Function) -> Outcome {
    let kept = select(map, |(_, value)| predicate.call1(value.clone()))?;
    Ok(kept.map(|entries| Value::Map(entries.into_iter().collect())))
}

pub(crate) fn flat_map(map: ValueMap, flat_mapper: &Function) -> Outcome {
    assemble(map.into_values(), flat_mapper)?.on_resolve(|monads| {
        Ok(flatten::merge(monads)?.map(|entries| Value::Map(entries.into_iter().collect())))
    })
}
