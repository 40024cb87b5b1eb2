//! Error types for combinator dispatch and execution.
//!
//! The engine never recovers from, retries, or wraps a caller's failure.
//! An operator that fails synchronously surfaces as an `Err` returned from
//! the call, and an operator whose deferred result fails surfaces as an `Err`
//! produced when the [`Pending`](crate::deferred::Pending) is awaited. In both
//! cases the caller's error travels inside [`Error::Operator`] untouched.
//!
//! The remaining variants describe misuse of a combinator, and are always
//! reported synchronously, before any deferred work is created.
//!
//! # Examples
//!
//! ```rust
//! use shapeflow::{Error, Value, map_series};
//! use shapeflow::value::Function;
//!
//! let doubled = map_series(Function::unary(|value: Value| value));
//! let error = doubled.call1(Value::from("not an array")).unwrap_err();
//! assert!(matches!(error, Error::TypeConstraint { .. }));
//! ```

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::shape::Shape;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by combinators and by the operators they run.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A combinator received a value shape it explicitly does not support.
    #[error("{combinator}: expected {expected}, found {found}")]
    TypeConstraint {
        /// Name of the combinator that rejected the value.
        combinator: &'static str,
        /// Human readable description of what was expected.
        expected: &'static str,
        /// The shape that was actually received.
        found: Shape,
    },

    /// An operator returned a deferred result while a synchronous pull
    /// sequence was being driven.
    ///
    /// Synchronous iterators cannot suspend; use an asynchronous pull sequence
    /// (`Value::Stream`) when the operator may be deferred.
    #[error("{combinator}: operator returned a deferred result inside a synchronous pull sequence")]
    DeferredInSyncSequence {
        /// Name of the combinator driving the sequence.
        combinator: &'static str,
    },

    /// The concurrency limit of a bounded pool was zero.
    #[error("concurrency limit must be greater than 0")]
    InvalidConcurrencyLimit,

    /// A failure raised by a caller supplied operator, propagated unchanged.
    #[error("{0}")]
    Operator(Failure),
}

impl Error {
    /// Wraps a caller's error as an operator failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::Error;
    ///
    /// let error = Error::operator(std::fmt::Error);
    /// assert_eq!(error.to_string(), "an error occurred when formatting an argument");
    /// ```
    pub fn operator<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::Operator(Failure(Rc::new(error)))
    }

    /// Creates an operator failure from a plain message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::Error;
    ///
    /// assert_eq!(Error::msg("boom").to_string(), "boom");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Self::operator(Message(message.into()))
    }

    pub(crate) const fn type_constraint(
        combinator: &'static str,
        expected: &'static str,
        found: Shape,
    ) -> Self {
        Self::TypeConstraint {
            combinator,
            expected,
            found,
        }
    }

    /// Returns the caller's error if this is an operator failure of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Operator(failure) => failure.0.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A shared handle to an error raised by a caller supplied operator.
#[derive(Clone)]
pub struct Failure(Rc<dyn std::error::Error>);

impl Failure {
    /// Returns the wrapped error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + 'static) {
        &*self.0
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, formatter)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, formatter)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_constraint_display() {
        let error = Error::type_constraint("map_series", "an array", Shape::Object);
        assert_eq!(
            error.to_string(),
            "map_series: expected an array, found object"
        );
    }

    #[test]
    fn test_operator_failure_is_transparent() {
        let error = Error::msg("disk on fire");
        assert_eq!(error.to_string(), "disk on fire");
        assert!(matches!(error, Error::Operator(_)));
    }

    #[test]
    fn test_downcast_recovers_caller_error() {
        let error = Error::operator(std::fmt::Error);
        assert!(error.downcast_ref::<std::fmt::Error>().is_some());
        assert!(Error::InvalidConcurrencyLimit
            .downcast_ref::<std::fmt::Error>()
            .is_none());
    }

    #[test]
    fn test_deferred_in_sync_sequence_display() {
        let error = Error::DeferredInSyncSequence { combinator: "map" };
        assert_eq!(
            error.to_string(),
            "map: operator returned a deferred result inside a synchronous pull sequence"
        );
    }
}
