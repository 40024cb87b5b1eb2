//! Plain object executors. Operators see values only; keys are carried over.

use crate::deferred::Outcome;
use crate::value::{Function, Object, Value};

use super::{assemble, flatten, select};

pub(crate) fn map(object: Object, mapper: &Function) -> Outcome {
    let (keys, values): (Vec<String>, Vec<Value>) = object.into_iter().unzip();
    Ok(assemble(values, mapper)?
        .map(move |results| Value::Object(keys.into_iter().zip(results).collect())))
}

pub(crate) fn filter(object: Object, predicate: &Function) -> Outcome {
    let kept = select(object, |(_, value)| predicate.call1(value.clone()))?;
    Ok(kept.map(|entries| Value::Object(entries.into_iter().collect())))
}

/// Merges the keyed results of the flat-mapper into one object. Mapping keys
/// are rendered as text.
pub(crate) fn flat_map(object: Object, flat_mapper: &Function) -> Outcome {
    assemble(object.into_values(), flat_mapper)?.on_resolve(|monads| {
        Ok(flatten::merge(monads)?.map(|entries| {
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            )
        }))
    })
}
