//! Transducers and accumulation.
//!
//! A *transducer* is a [`Function`] from one reducer to another. The
//! combinators [`map`](crate::map), [`filter`](crate::filter) and
//! [`flat_map`](crate::flat_map) become transducers when their argument is a
//! plain function: they wrap that reducer with [`reducer_map`],
//! [`reducer_filter`] or [`reducer_flat_map`]. Transducers compose with
//! [`pipe`](crate::pipe), which runs right to left when handed a reducer.
//!
//! [`transform`] folds a collection through a transducer into an
//! accumulator. The *extend* reducer at the bottom of the chain is chosen from
//! the accumulator's shape:
//!
//! | accumulator | extend                                          |
//! |-------------|-------------------------------------------------|
//! | array       | push, splicing array items                      |
//! | bytes       | collect into an array, then append as bytes     |
//! | text        | append the item rendered as text                |
//! | foreign     | `concat`, or `write` for sinks                  |
//! | set         | insert, splicing set items                      |
//! | object      | merge object and mapping items                  |
//! | mapping     | merge mapping and object items, insert pairs    |
//! | otherwise   | discard, returning the accumulator unchanged    |
//!
//! # Examples
//!
//! ```rust
//! use shapeflow::value::{Function, Value};
//! use shapeflow::{filter, map, pipe, transform};
//!
//! let is_odd = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) % 2 == 1));
//! let square = Function::unary(|value: Value| {
//!     let number = value.as_int().unwrap_or(0);
//!     Value::from(number * number)
//! });
//! let squared_odds = pipe([filter(is_odd), map(square)]);
//!
//! let text = transform(squared_odds.clone(), "").call1(Value::array([1, 2, 3, 4, 5])).unwrap();
//! assert_eq!(text.into_immediate(), Some(Value::from("1925")));
//! ```

use futures::StreamExt;
use smallvec::smallvec;

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::{Error, Result};
use crate::executor::bytes::extend_buffer;
use crate::reduce::fold;
use crate::shape::Shape;
use crate::value::{Args, Capabilities, Function, Value};

/// Folds the first argument through `transducer` into a copy of `init`.
///
/// A function `init` is an initializer called with the fold's arguments to
/// produce a fresh accumulator for every call. Any other `init` is cloned per
/// call, so calls never share an accumulator. Foreign sinks are shared
/// handles, and every call writes into the same sink.
pub fn transform(transducer: Function, init: impl Into<Value>) -> Function {
    match init.into() {
        Value::Function(initializer) => Function::new(move |args: Args| {
            let accumulator = initializer.call(args.clone())?;
            let transducer = transducer.clone();
            accumulator.on_resolve(move |accumulator| accumulate(args, &transducer, accumulator))
        }),
        accumulator => Function::new(move |args| accumulate(args, &transducer, accumulator.clone())),
    }
}

/// Folds `args[0]` through `transducer` into `accumulator`.
pub fn accumulate(args: Args, transducer: &Function, accumulator: Value) -> Outcome {
    match accumulator.shape() {
        Shape::Array => fold(args, &transduce(transducer, array_extend())?, Some(accumulator)),
        Shape::Bytes => {
            let collected = fold(
                args,
                &transduce(transducer, array_extend())?,
                Some(Value::Array(Vec::new())),
            )?;
            collected.on_resolve(move |collected| match accumulator {
                Value::Bytes(mut buffer) => {
                    extend_buffer(&mut buffer, &collected, "transform")?;
                    Ok(Eventual::Immediate(Value::Bytes(buffer)))
                }
                other => Err(mismatch("a byte accumulator", &other)),
            })
        }
        Shape::Text => fold(args, &transduce(transducer, text_extend())?, Some(accumulator)),
        Shape::Foreign(capabilities) if capabilities.contains(Capabilities::CONCAT) => {
            fold(args, &transduce(transducer, concat_extend())?, Some(accumulator))
        }
        Shape::Foreign(capabilities) if capabilities.contains(Capabilities::WRITE) => {
            fold(args, &transduce(transducer, write_extend())?, Some(accumulator))
        }
        Shape::Set => fold(args, &transduce(transducer, set_extend())?, Some(accumulator)),
        Shape::Object => fold(args, &transduce(transducer, object_extend())?, Some(accumulator)),
        Shape::Map => fold(args, &transduce(transducer, map_extend())?, Some(accumulator)),
        _ => discard(args, transducer, accumulator),
    }
}

/// Runs the transducer for its effects only, then hands back `accumulator`.
fn discard(args: Args, transducer: &Function, accumulator: Value) -> Outcome {
    let keep_first = Function::reducer(|accumulator, _| Ok(Eventual::Immediate(accumulator)));
    let settled = fold(args, &transduce(transducer, keep_first)?, Some(Value::Null))?;
    Ok(settled.map(move |_| accumulator))
}

/// Applies a transducer to a reducer.
fn transduce(transducer: &Function, reducer: Function) -> Result<Function> {
    match transducer.call1(Value::Function(reducer))? {
        Eventual::Immediate(Value::Function(reducer)) => Ok(reducer),
        Eventual::Immediate(other) => Err(Error::type_constraint(
            "transform",
            "a transducer that returns a reducer",
            other.shape(),
        )),
        Eventual::Deferred(_) => Err(Error::type_constraint(
            "transform",
            "a transducer that returns its reducer immediately",
            Shape::Function,
        )),
    }
}

// =============================================================================
// Extend reducers
// =============================================================================

fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::type_constraint("transform", expected, found.shape())
}

fn array_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Array(mut items) => {
            match item {
                Value::Array(more) => items.extend(more),
                item => items.push(item),
            }
            Ok(Eventual::Immediate(Value::Array(items)))
        }
        other => Err(mismatch("an array accumulator", &other)),
    })
}

fn text_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Str(mut text) => {
            match item {
                Value::Str(more) => text.push_str(&more),
                item => text.push_str(&item.to_string()),
            }
            Ok(Eventual::Immediate(Value::Str(text)))
        }
        other => Err(mismatch("a text accumulator", &other)),
    })
}

fn set_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Set(mut set) => {
            match item {
                Value::Set(more) => set.extend(more),
                item => {
                    set.insert(item);
                }
            }
            Ok(Eventual::Immediate(Value::Set(set)))
        }
        other => Err(mismatch("a set accumulator", &other)),
    })
}

fn object_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Object(mut object) => {
            match item {
                Value::Object(more) => object.extend(more),
                Value::Map(more) => {
                    object.extend(more.into_iter().map(|(key, value)| (key.to_string(), value)));
                }
                _ => {}
            }
            Ok(Eventual::Immediate(Value::Object(object)))
        }
        other => Err(mismatch("an object accumulator", &other)),
    })
}

fn map_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Map(mut map) => {
            match item {
                Value::Map(more) => map.extend(more),
                Value::Object(more) => {
                    map.extend(more.into_iter().map(|(key, value)| (Value::Str(key), value)));
                }
                Value::Array(pair) if pair.len() == 2 => {
                    let mut pair = pair.into_iter();
                    let key = pair.next().unwrap_or_default();
                    let value = pair.next().unwrap_or_default();
                    map.insert(key, value);
                }
                _ => {}
            }
            Ok(Eventual::Immediate(Value::Map(map)))
        }
        other => Err(mismatch("a mapping accumulator", &other)),
    })
}

fn concat_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Foreign(foreign) => foreign.concat(item),
        other => Err(mismatch("a concatenable accumulator", &other)),
    })
}

fn write_extend() -> Function {
    Function::reducer(|accumulator, item| match accumulator {
        Value::Foreign(sink) => match item {
            Value::Stream(mut chunks) => Ok(Eventual::Deferred(Pending::new(async move {
                while let Some(chunk) = chunks.next().await {
                    sink.write(chunk?)?.resolve().await?;
                }
                Ok(Value::Foreign(sink))
            }))),
            chunk => {
                let written = sink.write(chunk)?;
                Ok(written.map(move |()| Value::Foreign(sink)))
            }
        },
        other => Err(mismatch("a writable accumulator", &other)),
    })
}

// =============================================================================
// Reducer-position personalities
// =============================================================================

/// Wraps `reducer` so each element is mapped before it is folded.
pub fn reducer_map(reducer: Function, mapper: Function) -> Function {
    Function::reducer(move |accumulator, element| {
        let reducer = reducer.clone();
        mapper
            .call1(element)?
            .on_resolve(move |mapped| reducer.call2(accumulator, mapped))
    })
}

/// Wraps `reducer` so only elements satisfying `predicate` are folded.
pub fn reducer_filter(reducer: Function, predicate: Function) -> Function {
    Function::reducer(move |accumulator, element| {
        let reducer = reducer.clone();
        predicate.call1(element.clone())?.on_resolve(move |verdict| {
            if verdict.is_truthy() {
                reducer.call2(accumulator, element)
            } else {
                Ok(Eventual::Immediate(accumulator))
            }
        })
    })
}

/// Wraps `reducer` so each element is flat-mapped and every item of the
/// result is folded, one level deep.
pub fn reducer_flat_map(reducer: Function, flat_mapper: Function) -> Function {
    Function::reducer(move |accumulator, element| {
        let reducer = reducer.clone();
        flat_mapper
            .call1(element)?
            .on_resolve(move |monad| fold(smallvec![monad], &reducer, Some(accumulator)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter, map, pipe};
    use futures::executor::block_on;
    use rstest::rstest;

    fn is_odd() -> Function {
        Function::unary(|value| Value::from(value.as_int().unwrap_or(0) % 2 == 1))
    }

    fn square() -> Function {
        Function::unary(|value| {
            let number = value.as_int().unwrap_or(0);
            Value::from(number * number)
        })
    }

    fn squared_odds() -> Function {
        pipe([filter(is_odd()), map(square())])
    }

    fn immediate(outcome: Outcome) -> Value {
        outcome.unwrap().into_immediate().unwrap()
    }

    #[rstest]
    #[case(Value::array(Vec::<Value>::new()), Value::array([1, 9, 25]))]
    #[case(Value::from(""), Value::from("1925"))]
    #[case(Value::set(Vec::<Value>::new()), Value::set([1, 9, 25]))]
    #[case(Value::bytes(vec![0_u8]), Value::bytes([0_u8, 1, 9, 25]))]
    #[case(Value::Null, Value::Null)]
    #[case(Value::from(7), Value::from(7))]
    fn test_accumulator_decides_extend(#[case] init: Value, #[case] expected: Value) {
        let transformed = transform(squared_odds(), init).call1(Value::array([1, 2, 3, 4, 5]));
        assert_eq!(immediate(transformed), expected);
    }

    #[rstest]
    fn test_accumulator_is_fresh_per_call() {
        let collect = transform(map(square()), Value::array(Vec::<Value>::new()));
        assert_eq!(immediate(collect.call1(Value::array([2]))), Value::array([4]));
        assert_eq!(immediate(collect.call1(Value::array([3]))), Value::array([9]));
    }

    #[rstest]
    fn test_mapping_accumulator_inserts_pairs() {
        let pair = Function::unary(|value: Value| Value::array([value.clone(), value]));
        let transformed = transform(map(pair), Value::map(Vec::<(Value, Value)>::new()))
            .call1(Value::array([1, 2]));
        assert_eq!(immediate(transformed), Value::map([(1, 1), (2, 2)]));
    }

    #[rstest]
    fn test_reducer_flat_map_folds_one_level() {
        let push = array_extend();
        let nested = Function::unary(|value: Value| Value::array([Value::array([value])]));
        let flattening = reducer_flat_map(push, nested);
        let folded = flattening.call2(Value::Array(Vec::new()), Value::from(1));
        assert_eq!(immediate(folded), Value::array([1]));
    }

    #[rstest]
    fn test_deferred_mapper_defers_transform() {
        let slow_square = Function::deferred(|value: Value| async move {
            let number = value.as_int().unwrap_or(0);
            Ok(Value::from(number * number))
        });
        let transformed = transform(map(slow_square), Value::array(Vec::<Value>::new()))
            .call1(Value::array([1, 2]))
            .unwrap();
        assert!(transformed.is_pending());
        assert_eq!(block_on(transformed.resolve()).unwrap(), Value::array([1, 4]));
    }
}
