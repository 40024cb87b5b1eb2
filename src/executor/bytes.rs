//! Byte buffer executors.
//!
//! Elements are presented to operators as integers. Results are stored back
//! as bytes: integers wrap modulo 256, floats truncate first, booleans become
//! `0` or `1`, and `NaN` or infinities become `0`.

use crate::deferred::{Eventual, Outcome};
use crate::error::{Error, Result};
use crate::value::{Function, Value};

use super::{assemble, flatten, select};

/// Converts a numeric value to a byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_byte(value: &Value, combinator: &'static str) -> Result<u8> {
    match value {
        Value::Int(number) => Ok(*number as u8),
        Value::Float(number) if number.is_finite() => Ok((number.trunc() as i64) as u8),
        Value::Float(_) => Ok(0),
        Value::Bool(flag) => Ok(u8::from(*flag)),
        other => Err(Error::type_constraint(
            combinator,
            "a byte-convertible number",
            other.shape(),
        )),
    }
}

/// Appends `item` to `buffer`: arrays and byte buffers are spliced in, any
/// other value is appended as a single byte.
pub(crate) fn extend_buffer(buffer: &mut Vec<u8>, item: &Value, combinator: &'static str) -> Result<()> {
    match item {
        Value::Bytes(bytes) => buffer.extend_from_slice(bytes),
        Value::Array(items) => {
            for item in items {
                buffer.push(to_byte(item, combinator)?);
            }
        }
        other => buffer.push(to_byte(other, combinator)?),
    }
    Ok(())
}

fn integers(bytes: Vec<u8>) -> impl Iterator<Item = Value> {
    bytes.into_iter().map(Value::from)
}

fn collect(values: &[Value], combinator: &'static str) -> Result<Value> {
    let mut buffer = Vec::with_capacity(values.len());
    for value in values {
        buffer.push(to_byte(value, combinator)?);
    }
    Ok(Value::Bytes(buffer))
}

pub(crate) fn map(bytes: Vec<u8>, mapper: &Function) -> Outcome {
    assemble(integers(bytes), mapper)?
        .on_resolve(|results| collect(&results, "map").map(Eventual::Immediate))
}

pub(crate) fn filter(bytes: Vec<u8>, predicate: &Function) -> Outcome {
    let kept = select(bytes, |byte| predicate.call1(Value::from(*byte)))?;
    Ok(kept.map(Value::Bytes))
}

pub(crate) fn flat_map(bytes: Vec<u8>, flat_mapper: &Function) -> Outcome {
    assemble(integers(bytes), flat_mapper)?.on_resolve(|monads| {
        flatten::sequence(monads)?.on_resolve(|flattened| {
            let mut buffer = Vec::with_capacity(flattened.len());
            for item in &flattened {
                extend_buffer(&mut buffer, item, "flat_map")?;
            }
            Ok(Eventual::Immediate(Value::Bytes(buffer)))
        })
    })
}
