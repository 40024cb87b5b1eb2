//! Text executors. Text is traversed one character at a time and results are
//! joined back into text, with `null` results contributing nothing.

use crate::deferred::Outcome;
use crate::value::{Function, Value, characters, join_text};

use super::{assemble, flatten, select};

fn joined(values: Vec<Value>) -> Value {
    Value::Str(join_text(&values))
}

pub(crate) fn map(text: &str, mapper: &Function) -> Outcome {
    Ok(assemble(characters(text), mapper)?.map(joined))
}

pub(crate) fn filter(text: &str, predicate: &Function) -> Outcome {
    let kept = select(characters(text), |character| predicate.call1(character.clone()))?;
    Ok(kept.map(joined))
}

pub(crate) fn flat_map(text: &str, flat_mapper: &Function) -> Outcome {
    assemble(characters(text), flat_mapper)?
        .on_resolve(|monads| Ok(flatten::sequence(monads)?.map(joined)))
}
