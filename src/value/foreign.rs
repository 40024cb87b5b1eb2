//! Values that provide their own traversal capabilities.
//!
//! A [`Foreign`] value stands in for any collection the engine does not know
//! natively: a persistent vector, a database cursor, a writable sink. It
//! advertises which operations it supports through [`Capabilities`], and the
//! dispatchers delegate to the matching trait method.

use std::fmt;
use std::ops::BitOr;

use crate::deferred::Outcome;
use crate::error::Error;
use crate::shape::Shape;

use super::{Function, Value};

/// The set of traversal operations a [`Foreign`] value supports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self(0);
    /// Supports [`Foreign::map`].
    pub const MAP: Self = Self(1);
    /// Supports [`Foreign::filter`].
    pub const FILTER: Self = Self(1 << 1);
    /// Supports [`Foreign::reduce`].
    pub const REDUCE: Self = Self(1 << 2);
    /// Supports [`Foreign::chain`].
    pub const CHAIN: Self = Self(1 << 3);
    /// Supports [`Foreign::flat_map`].
    pub const FLAT_MAP: Self = Self(1 << 4);
    /// Supports [`Foreign::concat`].
    pub const CONCAT: Self = Self(1 << 5);
    /// Supports [`Foreign::write`].
    pub const WRITE: Self = Self(1 << 6);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::MAP, "MAP"),
        (Self::FILTER, "FILTER"),
        (Self::REDUCE, "REDUCE"),
        (Self::CHAIN, "CHAIN"),
        (Self::FLAT_MAP, "FLAT_MAP"),
        (Self::CONCAT, "CONCAT"),
        (Self::WRITE, "WRITE"),
    ];

    /// Returns `true` if every capability in `other` is present.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the capabilities present in either set.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if no capability is present.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        self.union(other)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = formatter.debug_set();
        for (capability, name) in Self::NAMES {
            if self.contains(capability) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// A value that implements its own traversal operations.
///
/// Every operation defaults to a [`Error::TypeConstraint`]. Implementors
/// override the operations they advertise in [`Foreign::capabilities`];
/// dispatchers only call an operation whose capability is present.
///
/// # Examples
///
/// ```rust
/// use shapeflow::value::{Capabilities, Foreign, Function, Value};
/// use shapeflow::{Eventual, Outcome, map};
///
/// #[derive(Debug)]
/// struct Doubled(Vec<i64>);
///
/// impl Foreign for Doubled {
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::MAP
///     }
///
///     fn map(&self, mapper: &Function) -> Outcome {
///         let mut results = Vec::new();
///         for number in &self.0 {
///             match mapper.call1(Value::from(*number * 2))? {
///                 Eventual::Immediate(value) => results.push(value),
///                 Eventual::Deferred(_) => unimplemented!(),
///             }
///         }
///         Ok(Eventual::Immediate(Value::Array(results)))
///     }
/// }
///
/// let increment = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) + 1));
/// let mapped = map(increment).call1(Value::foreign(Doubled(vec![1, 2]))).unwrap();
/// assert_eq!(mapped.into_immediate(), Some(Value::array([3, 5])));
/// ```
pub trait Foreign: fmt::Debug {
    /// Name used when the value is rendered as text.
    fn type_name(&self) -> &'static str {
        "Foreign"
    }

    /// The operations this value supports.
    fn capabilities(&self) -> Capabilities;

    /// Applies `mapper` to every element.
    fn map(&self, mapper: &Function) -> Outcome {
        let _ = mapper;
        Err(self.unsupported("map"))
    }

    /// Keeps the elements for which `predicate` is truthy.
    fn filter(&self, predicate: &Function) -> Outcome {
        let _ = predicate;
        Err(self.unsupported("filter"))
    }

    /// Folds the elements with `reducer`, starting from `init` when present.
    fn reduce(&self, reducer: &Function, init: Option<Value>) -> Outcome {
        let _ = (reducer, init);
        Err(self.unsupported("reduce"))
    }

    /// Monadic bind.
    fn chain(&self, function: &Function) -> Outcome {
        let _ = function;
        Err(self.unsupported("chain"))
    }

    /// Monadic bind under its flat-map name.
    fn flat_map(&self, function: &Function) -> Outcome {
        let _ = function;
        Err(self.unsupported("flat_map"))
    }

    /// Returns this value extended with `values`.
    fn concat(&self, values: Value) -> Outcome {
        let _ = values;
        Err(self.unsupported("concat"))
    }

    /// Writes `chunk` into this value, which acts as a sink.
    fn write(&self, chunk: Value) -> Outcome<()> {
        let _ = chunk;
        Err(self.unsupported("write"))
    }

    #[doc(hidden)]
    fn unsupported(&self, operation: &'static str) -> Error {
        Error::type_constraint(
            operation,
            "a foreign value supporting this operation",
            Shape::Foreign(self.capabilities()),
        )
    }
}
