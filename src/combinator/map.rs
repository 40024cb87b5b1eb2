//! Shape-preserving mapping.
//!
//! [`map`] applies a mapper to every element of whatever it is given and
//! returns the same shape. Eager mappers give eager results; the first
//! deferred result switches the whole call to a deferred one, and results are
//! still placed in input order.
//!
//! | input                    | result                                     |
//! |--------------------------|--------------------------------------------|
//! | array                    | array                                      |
//! | plain function (reducer) | reducer mapping each element first         |
//! | generator function       | generator function of mapped sequences     |
//! | byte buffer              | byte buffer                                |
//! | null                     | null                                       |
//! | pull sequence            | lazily mapped pull sequence                |
//! | text                     | text                                       |
//! | set, mapping, object     | same shape, keys carried over              |
//! | foreign with `map`       | whatever the foreign `map` returns         |
//! | anything else            | the mapper applied to the value itself     |

use crate::deferred::{Eventual, Outcome};
use crate::error::{Error, Result};
use crate::executor::iter::{MappingIter, wrap_generator};
use crate::executor::stream::{MappingStream, wrap_async_generator};
use crate::executor::{array, bytes, mapping, object, set, text};
use crate::transform::reducer_map;
use crate::value::{Capabilities, Function, FunctionKind, PullIter, PullStream, Value};

/// Maps every element of a value, preserving its shape.
///
/// # Examples
///
/// ```rust
/// use shapeflow::map;
/// use shapeflow::value::{Function, Value};
///
/// let square = Function::unary(|value: Value| {
///     let number = value.as_int().unwrap_or(0);
///     Value::from(number * number)
/// });
/// let squared = map(square).call1(Value::array([1, 2, 3])).unwrap();
/// assert_eq!(squared.into_immediate(), Some(Value::array([1, 4, 9])));
/// ```
pub fn map(mapper: Function) -> Function {
    Function::operator(move |value| map_value(value, &mapper))
}

pub(crate) fn map_value(value: Value, mapper: &Function) -> Outcome {
    match value {
        Value::Array(items) => array::map(items, mapper),
        Value::Function(function) => {
            let mapper = mapper.clone();
            let mapped = match function.kind() {
                FunctionKind::Plain => reducer_map(function, mapper),
                FunctionKind::Generator => wrap_generator(function, move |source| {
                    PullIter::new(MappingIter::new(source, mapper.clone()))
                }),
                FunctionKind::AsyncGenerator => wrap_async_generator(function, move |source| {
                    PullStream::new(MappingStream::new(source, mapper.clone()))
                }),
            };
            Ok(Eventual::Immediate(Value::Function(mapped)))
        }
        Value::Bytes(buffer) => bytes::map(buffer, mapper),
        Value::Null => Ok(Eventual::Immediate(Value::Null)),
        Value::Iter(source) => Ok(Eventual::Immediate(Value::Iter(PullIter::new(
            MappingIter::new(source, mapper.clone()),
        )))),
        Value::Stream(source) => Ok(Eventual::Immediate(Value::Stream(PullStream::new(
            MappingStream::new(source, mapper.clone()),
        )))),
        Value::Str(content) => text::map(&content, mapper),
        Value::Set(members) => set::map(members, mapper),
        Value::Map(entries) => mapping::map(entries, mapper),
        Value::Foreign(foreign) if foreign.capabilities().contains(Capabilities::MAP) => {
            foreign.map(mapper)
        }
        Value::Object(entries) => object::map(entries, mapper),
        other => mapper.call1(other),
    }
}

fn expect_array(value: Value, combinator: &'static str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::type_constraint(combinator, "an array", other.shape())),
    }
}

/// Maps an array one element at a time: the mapper is not invoked on an
/// element until the previous element's result has settled.
///
/// # Errors
///
/// The returned function fails with [`Error::TypeConstraint`] on anything but
/// an array.
pub fn map_series(mapper: Function) -> Function {
    Function::operator(move |value| array::map_series(expect_array(value, "map_series")?, &mapper))
}

/// Maps an array with at most `limit` deferred results in flight at once.
///
/// Results keep input order. A `limit` of zero makes every call fail with
/// [`Error::InvalidConcurrencyLimit`].
///
/// # Examples
///
/// ```rust,ignore
/// use shapeflow::map_pool;
///
/// let fetched = map_pool(2, fetch_user).call1(user_ids)?.resolve().await?;
/// ```
pub fn map_pool(limit: usize, mapper: Function) -> Function {
    Function::operator(move |value| array::map_pool(expect_array(value, "map_pool")?, limit, &mapper))
}

/// Maps an array, calling the mapper with `(element, index)`.
pub fn map_with_index(mapper: Function) -> Function {
    Function::operator(move |value| {
        array::map_with_index(expect_array(value, "map_with_index")?, &mapper)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use futures::executor::block_on;
    use rstest::rstest;

    fn increment() -> Function {
        Function::unary(|value| Value::from(value.as_int().unwrap_or(0) + 1))
    }

    #[rstest]
    #[case(Value::array([1, 2]), Value::array([2, 3]))]
    #[case(Value::set([1, 2]), Value::set([2, 3]))]
    #[case(Value::map([("a", 1)]), Value::map([("a", 2)]))]
    #[case(Value::object([("a", 1)]), Value::object([("a", 2)]))]
    #[case(Value::bytes([1_u8, 255]), Value::bytes([2_u8, 0]))]
    #[case(Value::Null, Value::Null)]
    #[case(Value::from(41), Value::from(42))]
    fn test_shape_is_preserved(#[case] input: Value, #[case] expected: Value) {
        let mapped = map(increment()).call1(input).unwrap().into_immediate();
        assert_eq!(mapped, Some(expected));
    }

    #[rstest]
    fn test_map_series_rejects_non_arrays() {
        let error = map_series(increment()).call1(Value::set([1])).unwrap_err();
        assert!(matches!(
            error,
            Error::TypeConstraint {
                combinator: "map_series",
                found: Shape::Set,
                ..
            }
        ));
    }

    #[rstest]
    fn test_map_pool_rejects_zero_limit() {
        let error = map_pool(0, increment()).call1(Value::array([1])).unwrap_err();
        assert!(matches!(error, Error::InvalidConcurrencyLimit));
    }

    #[rstest]
    fn test_map_with_index_passes_index() {
        let add_index = Function::binary(|element, index| {
            Value::from(element.as_int().unwrap_or(0) + index.as_int().unwrap_or(0))
        });
        let mapped = map_with_index(add_index).call1(Value::array([10, 10, 10])).unwrap();
        assert_eq!(mapped.into_immediate(), Some(Value::array([10, 11, 12])));
    }

    #[rstest]
    fn test_map_pool_keeps_order() {
        let slow_increment = Function::deferred(|value: Value| async move {
            Ok(Value::from(value.as_int().unwrap_or(0) + 1))
        });
        let mapped = map_pool(2, slow_increment)
            .call1(Value::array([1, 2, 3, 4, 5]))
            .unwrap();
        assert_eq!(
            block_on(mapped.resolve()).unwrap(),
            Value::array([2, 3, 4, 5, 6])
        );
    }
}
