//! Folding over any foldable shape.
//!
//! [`reduce`] and [`reduce_from`] build a function that folds its first
//! argument with a reducer `(accumulator, element) -> accumulator`. Folding is
//! strictly sequential. It runs synchronously until a reducer step defers,
//! then continues on an asynchronous path that awaits every later step in
//! turn.
//!
//! The collection argument decides how folding proceeds:
//!
//! - arrays, sets, mappings (as `[key, value]` pairs), text, byte buffers,
//!   plain objects (their values) and synchronous pull sequences fold
//!   element by element
//! - asynchronous pull sequences always fold asynchronously
//! - generator functions produce a new function that folds what they generate
//! - a plain function is treated as a reducer: the result is a function folding
//!   with the reducer chain composed from every function argument
//! - foreign values delegate to their own reduce, chain or flat-map
//! - anything else is passed to the reducer directly
//!
//! # Examples
//!
//! ```rust
//! use shapeflow::value::{Function, Value};
//! use shapeflow::{reduce, reduce_from};
//!
//! let add = Function::binary(|left: Value, right: Value| {
//!     Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0))
//! });
//!
//! let sum = reduce(add.clone()).call1(Value::array([1, 2, 3])).unwrap();
//! assert_eq!(sum.into_immediate(), Some(Value::from(6)));
//!
//! let seeded = reduce_from(add, 10).call1(Value::array([1, 2, 3])).unwrap();
//! assert_eq!(seeded.into_immediate(), Some(Value::from(16)));
//! ```

use futures::StreamExt;
use smallvec::smallvec;
use tracing::trace;

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::{Error, Result};
use crate::value::{Args, Capabilities, Function, FunctionKind, PullStream, Value};

/// Folds the first argument with `reducer`, seeding with its first element.
///
/// An empty collection folds to [`Value::Null`] without calling the reducer.
pub fn reduce(reducer: Function) -> Function {
    reducing(reducer, None)
}

/// Folds the first argument with `reducer`, starting from `init`.
///
/// A function `init` is an initializer: it is called with the same arguments
/// as the fold to compute a fresh seed for every call, and a deferred seed
/// defers the whole fold.
///
/// # Examples
///
/// ```rust
/// use shapeflow::value::{Function, Value};
/// use shapeflow::reduce_from;
///
/// let push = Function::binary(|accumulator: Value, element: Value| {
///     let mut items = accumulator.into_array().unwrap_or_default();
///     items.push(element);
///     Value::Array(items)
/// });
/// let fresh = Function::unary(|_| Value::array(Vec::<Value>::new()));
/// let collect = reduce_from(push, fresh);
///
/// let first = collect.call1(Value::set([1, 2])).unwrap().into_immediate();
/// let second = collect.call1(Value::set([3])).unwrap().into_immediate();
/// assert_eq!(first, Some(Value::array([1, 2])));
/// assert_eq!(second, Some(Value::array([3])));
/// ```
pub fn reduce_from(reducer: Function, init: impl Into<Value>) -> Function {
    reducing(reducer, Some(init.into()))
}

fn reducing(reducer: Function, init: Option<Value>) -> Function {
    match init {
        Some(Value::Function(initializer)) => Function::new(move |args: Args| {
            let seed = initializer.call(args.clone())?;
            let reducer = reducer.clone();
            seed.on_resolve(move |seed| fold(args, &reducer, Some(seed)))
        }),
        init => Function::new(move |args| fold(args, &reducer, init.clone())),
    }
}

/// Chains two reducers: `second` folds the accumulator produced by `first`
/// for the same element.
///
/// # Examples
///
/// ```rust
/// use shapeflow::value::{Function, Value};
/// use shapeflow::reducer_concat;
///
/// let add = Function::binary(|left: Value, right: Value| {
///     Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0))
/// });
/// let twice = reducer_concat(add.clone(), add);
/// let result = twice.call2(Value::from(1), Value::from(10)).unwrap();
/// assert_eq!(result.into_immediate(), Some(Value::from(21)));
/// ```
pub fn reducer_concat(first: Function, second: Function) -> Function {
    Function::reducer(move |accumulator, element| {
        let second = second.clone();
        first
            .call2(accumulator, element.clone())?
            .on_resolve(move |intermediate| second.call2(intermediate, element))
    })
}

/// Folds `args[0]` with `reducer`, starting from `seed` when present.
pub fn fold(args: Args, reducer: &Function, seed: Option<Value>) -> Outcome {
    let mut args = args.into_iter();
    let collection = args.next().unwrap_or_default();
    let collection = match collection.into_elements() {
        Ok(elements) => return fold_elements(elements, reducer.clone(), seed),
        Err(collection) => collection,
    };
    match collection {
        Value::Stream(stream) => Ok(Eventual::Deferred(fold_stream(stream, reducer.clone(), seed))),
        Value::Function(function) => match function.kind() {
            FunctionKind::Generator | FunctionKind::AsyncGenerator => {
                let reducer = reducer.clone();
                Ok(Eventual::Immediate(Value::Function(Function::new(move |args| {
                    let reducer = reducer.clone();
                    let seed = seed.clone();
                    function
                        .call(args)?
                        .on_resolve(move |sequence| fold(smallvec![sequence], &reducer, seed))
                }))))
            }
            FunctionKind::Plain => {
                let mut composed = reducer_concat(reducer.clone(), function);
                for next in args {
                    match next {
                        Value::Function(next) => composed = reducer_concat(composed, next),
                        other => {
                            return Err(Error::type_constraint(
                                "reduce",
                                "only reducers after a reducer",
                                other.shape(),
                            ));
                        }
                    }
                }
                Ok(Eventual::Immediate(Value::Function(Function::new(move |args| {
                    fold(args, &composed, seed.clone())
                }))))
            }
        },
        Value::Foreign(foreign) => {
            let capabilities = foreign.capabilities();
            if capabilities.contains(Capabilities::REDUCE) {
                foreign.reduce(reducer, seed)
            } else if capabilities.contains(Capabilities::CHAIN) {
                foreign.chain(&bind_seed(reducer, seed))
            } else if capabilities.contains(Capabilities::FLAT_MAP) {
                foreign.flat_map(&bind_seed(reducer, seed))
            } else {
                fold_single(Value::Foreign(foreign), reducer, seed)
            }
        }
        other => fold_single(other, reducer, seed),
    }
}

fn bind_seed(reducer: &Function, seed: Option<Value>) -> Function {
    let reducer = reducer.clone();
    let seed = seed.unwrap_or_default();
    Function::operator(move |element| reducer.call2(seed.clone(), element))
}

fn fold_single(value: Value, reducer: &Function, seed: Option<Value>) -> Outcome {
    match seed {
        Some(seed) => reducer.call2(seed, value),
        None => reducer.call1(value),
    }
}

fn fold_elements<I>(mut elements: I, reducer: Function, seed: Option<Value>) -> Outcome
where
    I: Iterator<Item = Result<Value>> + 'static,
{
    let mut accumulator = match seed {
        Some(seed) => seed,
        None => match elements.next() {
            Some(first) => first?,
            None => return Ok(Eventual::Immediate(Value::Null)),
        },
    };
    while let Some(element) = elements.next() {
        match reducer.call2(accumulator, element?)? {
            Eventual::Immediate(next) => accumulator = next,
            Eventual::Deferred(pending) => {
                trace!("fold switched to its continuation path");
                return Ok(Eventual::Deferred(Pending::new(async move {
                    let mut accumulator = pending.await?;
                    for element in elements {
                        accumulator = reducer.call2(accumulator, element?)?.resolve().await?;
                    }
                    Ok(accumulator)
                })));
            }
        }
    }
    Ok(Eventual::Immediate(accumulator))
}

fn fold_stream(mut stream: PullStream, reducer: Function, seed: Option<Value>) -> Pending {
    Pending::new(async move {
        let mut accumulator = match seed {
            Some(seed) => seed,
            None => match stream.next().await {
                Some(first) => first?,
                None => return Ok(Value::Null),
            },
        };
        while let Some(element) = stream.next().await {
            accumulator = reducer.call2(accumulator, element?)?.resolve().await?;
        }
        Ok(accumulator)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use rstest::rstest;

    fn add() -> Function {
        Function::binary(|left, right| {
            Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0))
        })
    }

    fn immediate(outcome: Outcome) -> Value {
        outcome.unwrap().into_immediate().unwrap()
    }

    #[rstest]
    #[case(Value::array([1, 2, 3]), Value::from(6))]
    #[case(Value::array(Vec::<Value>::new()), Value::Null)]
    #[case(Value::array([5]), Value::from(5))]
    #[case(Value::set([1, 2]), Value::from(3))]
    #[case(Value::object([("a", 4), ("b", 5)]), Value::from(9))]
    #[case(Value::bytes([1_u8, 2, 3]), Value::from(6))]
    fn test_unseeded_folds(#[case] collection: Value, #[case] expected: Value) {
        assert_eq!(immediate(reduce(add()).call1(collection)), expected);
    }

    #[rstest]
    fn test_empty_fold_never_calls_reducer() {
        let exploding = Function::reducer(|_, _| Err(Error::msg("called")));
        let folded = reduce(exploding).call1(Value::array(Vec::<Value>::new()));
        assert_eq!(immediate(folded), Value::Null);
    }

    #[rstest]
    fn test_deferred_step_switches_to_continuation() {
        let slow_add = Function::binary_deferred(|left: Value, right: Value| async move {
            Ok(Value::from(left.as_int().unwrap_or(0) + right.as_int().unwrap_or(0)))
        });
        let folded = reduce_from(slow_add, 10).call1(Value::array([1, 2, 3])).unwrap();
        assert!(folded.is_pending());
        assert_eq!(block_on(folded.resolve()).unwrap(), Value::from(16));
    }

    #[rstest]
    fn test_generator_collection_returns_function() {
        let numbers = Function::generator(|_| (1..=4).map(Value::from));
        let folding = immediate(reduce(add()).call1(Value::Function(numbers)));
        let Value::Function(folding) = folding else {
            panic!("expected a function");
        };
        assert_eq!(immediate(folding.call(Args::new())), Value::from(10));
    }

    #[rstest]
    fn test_reducer_collection_composes_reducers() {
        let double_then_add = Function::binary(|accumulator, element| {
            Value::from(accumulator.as_int().unwrap_or(0) + element.as_int().unwrap_or(0) * 2)
        });
        let composed = immediate(reduce_from(add(), 0).call1(Value::Function(double_then_add)));
        let Value::Function(composed) = composed else {
            panic!("expected a function");
        };
        // each element contributes once through add and twice through the second reducer
        assert_eq!(immediate(composed.call1(Value::array([1, 2]))), Value::from(9));
    }

    #[rstest]
    fn test_scalar_is_passed_to_reducer() {
        assert_eq!(immediate(reduce_from(add(), 1).call1(Value::from(2))), Value::from(3));
    }
}
