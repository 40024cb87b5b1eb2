//! Flattening of flat-map results.
//!
//! A flat-mapper may return any shape, called a *monad* here. Sequence
//! targets (arrays, sets, text, bytes, pull sequences) *spill* each monad into
//! the output one level deep. Keyed targets (objects, mappings) *merge* the
//! entries each monad contributes.
//!
//! Spilling an asynchronous monad cannot finish synchronously, so it is set
//! aside as a *late* stream and drained once everything immediate has been
//! placed. Late items arrive in completion order.

use std::iter;

use futures::stream::{self, LocalBoxStream, StreamExt};

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::Result;
use crate::value::{Capabilities, Foreign, Function, Value, characters};

/// A monad whose items are only available asynchronously.
pub(crate) type Late = LocalBoxStream<'static, Result<Value>>;

fn identity() -> Function {
    Function::unary(|value| value)
}

fn collect_into_array() -> Function {
    Function::binary(|accumulator, element| match accumulator {
        Value::Array(mut items) => {
            items.push(element);
            Value::Array(items)
        }
        _ => Value::array([element]),
    })
}

/// A late stream over the items of a value that settles later.
fn late_items(pending: Pending) -> Late {
    stream::once(pending)
        .flat_map(|settled| {
            let items: Vec<Result<Value>> = match settled {
                Ok(Value::Array(items)) => items.into_iter().map(Ok).collect(),
                Ok(other) => vec![Ok(other)],
                Err(error) => vec![Err(error)],
            };
            stream::iter(items)
        })
        .boxed_local()
}

/// Spills one monad into `out`, setting asynchronous monads aside in `late`.
///
/// * arrays, sets and synchronous pull sequences contribute their items
/// * text contributes one-character strings, bytes contribute integers
/// * mappings contribute `[key, value]` pairs, objects contribute their values
/// * asynchronous pull sequences become late streams
/// * foreign values delegate to chain, flat-map or reduce when supported
/// * anything else is contributed as is
pub(crate) fn spill<E>(monad: Value, out: &mut E, late: &mut Vec<Late>) -> Result<()>
where
    E: Extend<Value>,
{
    match monad {
        Value::Array(items) => out.extend(items),
        Value::Set(set) => out.extend(set),
        Value::Map(map) => out.extend(
            map.into_iter()
                .map(|(key, value)| Value::Array(vec![key, value])),
        ),
        Value::Object(object) => out.extend(object.into_values()),
        Value::Str(text) => out.extend(characters(&text)),
        Value::Bytes(bytes) => out.extend(bytes.into_iter().map(Value::from)),
        Value::Iter(iter) => {
            for item in iter {
                out.extend(iter::once(item?));
            }
        }
        Value::Stream(stream) => late.push(stream.boxed_local()),
        Value::Foreign(foreign) => {
            let original = Value::Foreign(foreign.clone());
            spill_foreign(&*foreign, original, out, late)?;
        }
        other => out.extend(iter::once(other)),
    }
    Ok(())
}

fn spill_foreign<E>(foreign: &dyn Foreign, original: Value, out: &mut E, late: &mut Vec<Late>) -> Result<()>
where
    E: Extend<Value>,
{
    let capabilities = foreign.capabilities();
    let bound = if capabilities.contains(Capabilities::CHAIN) {
        foreign.chain(&identity())?
    } else if capabilities.contains(Capabilities::FLAT_MAP) {
        foreign.flat_map(&identity())?
    } else if capabilities.contains(Capabilities::REDUCE) {
        foreign.reduce(&collect_into_array(), Some(Value::Array(Vec::new())))?
    } else {
        out.extend(iter::once(original));
        return Ok(());
    };
    match bound {
        Eventual::Immediate(Value::Array(items)) => out.extend(items),
        Eventual::Immediate(value) => out.extend(iter::once(value)),
        Eventual::Deferred(pending) => late.push(late_items(pending)),
    }
    Ok(())
}

/// Flattens monads one level into a sequence.
pub(crate) fn sequence(monads: Vec<Value>) -> Outcome<Vec<Value>> {
    let mut out = Vec::with_capacity(monads.len());
    let mut late = Vec::new();
    for monad in monads {
        spill(monad, &mut out, &mut late)?;
    }
    if late.is_empty() {
        return Ok(Eventual::Immediate(out));
    }
    Ok(Eventual::Deferred(Pending::new(async move {
        let mut arrivals = stream::select_all(late);
        while let Some(item) = arrivals.next().await {
            out.push(item?);
        }
        Ok(out)
    })))
}

// =============================================================================
// Keyed merging
// =============================================================================

/// Adds the entries a keyed leaf contributes. Non-keyed leaves contribute
/// nothing.
fn merge_leaf(leaf: Value, entries: &mut Vec<(Value, Value)>) {
    match leaf {
        Value::Object(object) => {
            entries.extend(object.into_iter().map(|(key, value)| (Value::Str(key), value)));
        }
        Value::Map(map) => entries.extend(map),
        _ => {}
    }
}

fn merge_monad(monad: Value, entries: &mut Vec<(Value, Value)>, late: &mut Vec<Late>) -> Result<()> {
    match monad {
        Value::Object(_) | Value::Map(_) => merge_leaf(monad, entries),
        Value::Array(items) => items.into_iter().for_each(|item| merge_leaf(item, entries)),
        Value::Set(set) => set.into_iter().for_each(|item| merge_leaf(item, entries)),
        Value::Iter(iter) => {
            for item in iter {
                merge_leaf(item?, entries);
            }
        }
        Value::Stream(stream) => late.push(stream.boxed_local()),
        Value::Foreign(foreign) => {
            let capabilities = foreign.capabilities();
            let bound = if capabilities.contains(Capabilities::CHAIN) {
                foreign.chain(&identity())?
            } else if capabilities.contains(Capabilities::FLAT_MAP) {
                foreign.flat_map(&identity())?
            } else {
                return Ok(());
            };
            match bound {
                Eventual::Immediate(value) => merge_leaf(value, entries),
                Eventual::Deferred(pending) => late.push(stream::once(pending).boxed_local()),
            }
        }
        _ => {}
    }
    Ok(())
}

/// Merges the entries contributed by each monad, in arrival order.
///
/// Objects and mappings contribute their entries. Arrays, sets and pull
/// sequences contribute the entries of the keyed items they hold. Everything
/// else contributes nothing.
pub(crate) fn merge(monads: Vec<Value>) -> Outcome<Vec<(Value, Value)>> {
    let mut entries = Vec::new();
    let mut late = Vec::new();
    for monad in monads {
        merge_monad(monad, &mut entries, &mut late)?;
    }
    if late.is_empty() {
        return Ok(Eventual::Immediate(entries));
    }
    Ok(Eventual::Deferred(Pending::new(async move {
        let mut arrivals = stream::select_all(late);
        while let Some(item) = arrivals.next().await {
            merge_leaf(item?, &mut entries);
        }
        Ok(entries)
    })))
}
