//! Shape classification.
//!
//! Every dispatcher first asks which [`Shape`] a value has, then routes it to
//! the executor for that shape. Classification is total: any value receives
//! exactly one shape, and classifying the same value twice gives the same
//! answer.
//!
//! Categories are tested in a fixed precedence order:
//!
//! 1. array
//! 2. function, split into plain, generator and async generator
//! 3. byte buffer
//! 4. null
//! 5. synchronous pull sequence
//! 6. asynchronous pull sequence
//! 7. text
//! 8. set
//! 9. mapping
//! 10. foreign value, tagged with its capabilities
//! 11. plain object
//! 12. scalar
//!
//! # Examples
//!
//! ```rust
//! use shapeflow::{Shape, Value, classify};
//!
//! assert_eq!(classify(&Value::array([1, 2])), Shape::Array);
//! assert_eq!(classify(&Value::from("abc")), Shape::Text);
//! assert_eq!(classify(&Value::from(3.5)), Shape::Scalar);
//! ```

use std::fmt;

use crate::value::{Capabilities, FunctionKind, Value};

/// The category that decides which executor handles a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// An ordered sequence.
    Array,
    /// A plain callable.
    Function,
    /// A callable that produces synchronous pull sequences.
    GeneratorFunction,
    /// A callable that produces asynchronous pull sequences.
    AsyncGeneratorFunction,
    /// A byte buffer.
    Bytes,
    /// The absent value.
    Null,
    /// A synchronous pull sequence.
    Iterator,
    /// An asynchronous pull sequence.
    AsyncIterator,
    /// Text.
    Text,
    /// A set.
    Set,
    /// A key-ordered mapping.
    Map,
    /// A value exposing its own traversal operations.
    Foreign(Capabilities),
    /// A plain keyed object.
    Object,
    /// Anything else: booleans and numbers.
    Scalar,
}

impl Shape {
    /// Returns `true` for any of the three callable shapes.
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            Self::Function | Self::GeneratorFunction | Self::AsyncGeneratorFunction
        )
    }

    /// Returns the capabilities of a foreign shape, or none for native shapes.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Foreign(capabilities) => capabilities,
            _ => Capabilities::NONE,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Array => "array",
            Self::Function => "function",
            Self::GeneratorFunction => "generator function",
            Self::AsyncGeneratorFunction => "async generator function",
            Self::Bytes => "bytes",
            Self::Null => "null",
            Self::Iterator => "iterator",
            Self::AsyncIterator => "async iterator",
            Self::Text => "text",
            Self::Set => "set",
            Self::Map => "map",
            Self::Foreign(_) => "foreign",
            Self::Object => "object",
            Self::Scalar => "scalar",
        };
        formatter.write_str(name)
    }
}

/// Returns the shape of `value`.
pub fn classify(value: &Value) -> Shape {
    match value {
        Value::Array(_) => Shape::Array,
        Value::Function(function) => match function.kind() {
            FunctionKind::Plain => Shape::Function,
            FunctionKind::Generator => Shape::GeneratorFunction,
            FunctionKind::AsyncGenerator => Shape::AsyncGeneratorFunction,
        },
        Value::Bytes(_) => Shape::Bytes,
        Value::Null => Shape::Null,
        Value::Iter(_) => Shape::Iterator,
        Value::Stream(_) => Shape::AsyncIterator,
        Value::Str(_) => Shape::Text,
        Value::Set(_) => Shape::Set,
        Value::Map(_) => Shape::Map,
        Value::Foreign(foreign) => Shape::Foreign(foreign.capabilities()),
        Value::Object(_) => Shape::Object,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => Shape::Scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Function;
    use rstest::rstest;

    #[rstest]
    #[case(Value::array([1]), Shape::Array)]
    #[case(Value::Function(Function::unary(|value| value)), Shape::Function)]
    #[case(Value::Function(Function::generator(|_| Vec::new())), Shape::GeneratorFunction)]
    #[case(Value::bytes(vec![1_u8]), Shape::Bytes)]
    #[case(Value::Null, Shape::Null)]
    #[case(Value::iter(Vec::new()), Shape::Iterator)]
    #[case(Value::from("a"), Shape::Text)]
    #[case(Value::set([1]), Shape::Set)]
    #[case(Value::map([(1, 2)]), Shape::Map)]
    #[case(Value::object([("a", 1)]), Shape::Object)]
    #[case(Value::from(true), Shape::Scalar)]
    #[case(Value::from(0.5), Shape::Scalar)]
    fn test_classify(#[case] value: Value, #[case] expected: Shape) {
        assert_eq!(classify(&value), expected);
        assert_eq!(classify(&value), value.shape());
    }

    #[rstest]
    fn test_callable_shapes() {
        assert!(Shape::AsyncGeneratorFunction.is_callable());
        assert!(!Shape::Array.is_callable());
    }

    #[rstest]
    fn test_display_names() {
        assert_eq!(Shape::AsyncIterator.to_string(), "async iterator");
        assert_eq!(Shape::Foreign(Capabilities::MAP).to_string(), "foreign");
    }
}
