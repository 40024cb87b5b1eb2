//! Shape-preserving filtering.
//!
//! [`filter`] keeps the elements whose predicate result is truthy. Every
//! predicate call is made before any deferred verdict is awaited, and kept
//! elements stay in input order.

use crate::deferred::{Eventual, Outcome};
use crate::error::{Error, Result};
use crate::executor::iter::{FilteringIter, wrap_generator};
use crate::executor::stream::{FilteringStream, wrap_async_generator};
use crate::executor::{array, bytes, mapping, object, set, text};
use crate::transform::reducer_filter;
use crate::value::{Capabilities, Function, FunctionKind, PullIter, PullStream, Value};

/// Filters a value, preserving its shape.
///
/// Text keeps the characters that pass, mappings and objects keep the
/// entries whose *value* passes, and a plain function is treated as a reducer
/// that only sees passing elements. Scalars come back unchanged.
///
/// # Examples
///
/// ```rust
/// use shapeflow::filter;
/// use shapeflow::value::{Function, Value};
///
/// let odd = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) % 2 == 1));
/// let kept = filter(odd).call1(Value::object([("a", 1), ("b", 2), ("c", 3)])).unwrap();
/// assert_eq!(kept.into_immediate(), Some(Value::object([("a", 1), ("c", 3)])));
/// ```
pub fn filter(predicate: Function) -> Function {
    Function::operator(move |value| filter_value(value, &predicate))
}

pub(crate) fn filter_value(value: Value, predicate: &Function) -> Outcome {
    match value {
        Value::Array(items) => array::filter(items, predicate),
        Value::Function(function) => {
            let predicate = predicate.clone();
            let filtered = match function.kind() {
                FunctionKind::Plain => reducer_filter(function, predicate),
                FunctionKind::Generator => wrap_generator(function, move |source| {
                    PullIter::new(FilteringIter::new(source, predicate.clone()))
                }),
                FunctionKind::AsyncGenerator => wrap_async_generator(function, move |source| {
                    PullStream::new(FilteringStream::new(source, predicate.clone()))
                }),
            };
            Ok(Eventual::Immediate(Value::Function(filtered)))
        }
        Value::Bytes(buffer) => bytes::filter(buffer, predicate),
        Value::Null => Ok(Eventual::Immediate(Value::Null)),
        Value::Iter(source) => Ok(Eventual::Immediate(Value::Iter(PullIter::new(
            FilteringIter::new(source, predicate.clone()),
        )))),
        Value::Stream(source) => Ok(Eventual::Immediate(Value::Stream(PullStream::new(
            FilteringStream::new(source, predicate.clone()),
        )))),
        Value::Str(content) => text::filter(&content, predicate),
        Value::Set(members) => set::filter(members, predicate),
        Value::Map(entries) => mapping::filter(entries, predicate),
        Value::Foreign(foreign) if foreign.capabilities().contains(Capabilities::FILTER) => {
            foreign.filter(predicate)
        }
        Value::Object(entries) => object::filter(entries, predicate),
        other => Ok(Eventual::Immediate(other)),
    }
}

/// Filters an array, calling the predicate with `(element, index)`.
///
/// # Errors
///
/// The returned function fails with [`Error::TypeConstraint`] on anything but
/// an array.
pub fn filter_with_index(predicate: Function) -> Function {
    Function::operator(move |value| {
        array::filter_with_index(expect_array(value)?, &predicate)
    })
}

fn expect_array(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::type_constraint(
            "filter_with_index",
            "an array",
            other.shape(),
        )),
    }
}
