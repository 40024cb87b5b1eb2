//! Mapping followed by one level of flattening.
//!
//! Each flat-mapper result (a *monad*) is flattened into the output: arrays
//! and sets are spliced, mappings contribute `[key, value]` pairs, objects
//! their values, text its characters, byte buffers their bytes, and pull
//! sequences everything they produce. Anything else is kept as one item.
//!
//! Ordered inputs keep input order, including for asynchronous monads. An
//! asynchronous pull sequence input is the exception: its items are yielded
//! in completion order (see [`FlatMappingStream`]).

use crate::deferred::{Eventual, Outcome};
use crate::executor::iter::{FlatMappingIter, wrap_generator};
use crate::executor::stream::{FlatMappingStream, wrap_async_generator};
use crate::executor::{array, bytes, mapping, object, set, text};
use crate::transform::reducer_flat_map;
use crate::value::{Capabilities, Function, FunctionKind, PullIter, PullStream, Value};

/// Maps every element and flattens the results one level into the input's
/// shape.
///
/// # Examples
///
/// ```rust
/// use shapeflow::flat_map;
/// use shapeflow::value::{Function, Value};
///
/// let twice = Function::unary(|value: Value| Value::array([value.clone(), value]));
/// let doubled = flat_map(twice).call1(Value::array([1, 2])).unwrap();
/// assert_eq!(doubled.into_immediate(), Some(Value::array([1, 1, 2, 2])));
/// ```
///
/// [`FlatMappingStream`]: crate::executor::stream::FlatMappingStream
pub fn flat_map(flat_mapper: Function) -> Function {
    Function::operator(move |value| flat_map_value(value, &flat_mapper))
}

pub(crate) fn flat_map_value(value: Value, flat_mapper: &Function) -> Outcome {
    match value {
        Value::Array(items) => array::flat_map(items, flat_mapper),
        Value::Function(function) => {
            let flat_mapper = flat_mapper.clone();
            let flattened = match function.kind() {
                FunctionKind::Plain => reducer_flat_map(function, flat_mapper),
                FunctionKind::Generator => wrap_generator(function, move |source| {
                    PullIter::new(FlatMappingIter::new(source, flat_mapper.clone()))
                }),
                FunctionKind::AsyncGenerator => wrap_async_generator(function, move |source| {
                    PullStream::new(FlatMappingStream::new(source, flat_mapper.clone()))
                }),
            };
            Ok(Eventual::Immediate(Value::Function(flattened)))
        }
        Value::Bytes(buffer) => bytes::flat_map(buffer, flat_mapper),
        Value::Null => Ok(Eventual::Immediate(Value::Null)),
        Value::Iter(source) => Ok(Eventual::Immediate(Value::Iter(PullIter::new(
            FlatMappingIter::new(source, flat_mapper.clone()),
        )))),
        Value::Stream(source) => Ok(Eventual::Immediate(Value::Stream(PullStream::new(
            FlatMappingStream::new(source, flat_mapper.clone()),
        )))),
        Value::Foreign(foreign) if foreign.capabilities().contains(Capabilities::CHAIN) => {
            foreign.chain(flat_mapper)
        }
        Value::Foreign(foreign) if foreign.capabilities().contains(Capabilities::FLAT_MAP) => {
            foreign.flat_map(flat_mapper)
        }
        Value::Object(entries) => object::flat_map(entries, flat_mapper),
        Value::Set(members) => set::flat_map(members, flat_mapper),
        Value::Map(entries) => mapping::flat_map(entries, flat_mapper),
        Value::Str(content) => text::flat_map(&content, flat_mapper),
        other => flat_mapper.call1(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::stream;
    use rstest::rstest;

    fn identity() -> Function {
        Function::unary(|value| value)
    }

    #[rstest]
    fn test_mixed_monads_flatten_one_level() {
        let monads = Value::array([
            Value::array([1, 1]),
            Value::set([2]),
            Value::object([("a", 3)]),
        ]);
        let flattened = flat_map(identity()).call1(monads).unwrap();
        assert_eq!(flattened.into_immediate(), Some(Value::array([1, 1, 2, 3])));
    }

    #[rstest]
    fn test_nested_arrays_are_not_deep_flattened() {
        let monads = Value::array([Value::array([Value::array([1])])]);
        let flattened = flat_map(identity()).call1(monads).unwrap();
        assert_eq!(flattened.into_immediate(), Some(Value::array([Value::array([1])])));
    }

    #[rstest]
    fn test_set_results_are_deduplicated() {
        let halve = Function::unary(|value: Value| {
            let number = value.as_int().unwrap_or(0);
            Value::array([number / 2, number / 2])
        });
        let flattened = flat_map(halve).call1(Value::set([2, 3])).unwrap();
        assert_eq!(flattened.into_immediate(), Some(Value::set([1])));
    }

    #[rstest]
    fn test_text_monads_join() {
        let twice = Function::unary(|character: Value| {
            let character = character.as_str().unwrap_or_default().to_owned();
            Value::from(format!("{character}{character}"))
        });
        let flattened = flat_map(twice).call1(Value::from("ab")).unwrap();
        assert_eq!(flattened.into_immediate(), Some(Value::from("aabb")));
    }

    #[rstest]
    fn test_async_monads_keep_input_order_for_arrays() {
        let delayed_pair = Function::deferred(|value: Value| async move {
            Ok(Value::array([value.clone(), value]))
        });
        let flattened = flat_map(delayed_pair).call1(Value::array([1, 2])).unwrap();
        assert_eq!(
            block_on(flattened.resolve()).unwrap(),
            Value::array([1, 1, 2, 2])
        );
    }

    #[rstest]
    fn test_stream_monads_are_drained_into_arrays() {
        let streamed = Function::unary(|value: Value| Value::stream(stream::iter(vec![value])));
        let flattened = flat_map(streamed).call1(Value::array([1, 2])).unwrap();
        let Value::Array(items) = block_on(flattened.resolve()).unwrap() else {
            panic!("expected an array");
        };
        let mut items: Vec<i64> = items.iter().filter_map(Value::as_int).collect();
        items.sort_unstable();
        assert_eq!(items, vec![1, 2]);
    }

    #[rstest]
    fn test_null_stays_null() {
        let flattened = flat_map(identity()).call1(Value::Null).unwrap();
        assert_eq!(flattened.into_immediate(), Some(Value::Null));
    }
}
