//! # shapeflow
//!
//! Polymorphic functional combinators over dynamically shaped values, with
//! synchronous and asynchronous execution unified behind one calling
//! convention.
//!
//! ## Overview
//!
//! Every combinator works on [`Value`], a closed union of the containers the
//! engine knows how to traverse: arrays, sets, mappings, plain objects, text,
//! byte buffers, synchronous and asynchronous pull sequences, and generator
//! functions. The combinator classifies its argument ([`classify`]), picks the
//! algorithm for that [`Shape`], and returns a result of the same shape.
//!
//! Operators are [`Function`]s that return an [`Outcome`]: either a value
//! available now or a [`Pending`] one. Nothing needs to be declared up front.
//! A combinator stays on its eager path while every operator result is
//! immediate, and switches to a deferred path at the first pending result.
//!
//! - **Elementwise**: [`map`], [`filter`], [`flat_map`] and the array-only
//!   [`map_series`], [`map_pool`], [`map_with_index`], [`filter_with_index`]
//! - **Folding**: [`reduce`], [`reduce_from`], [`transform`] and the reducer
//!   transformers [`reducer_map`], [`reducer_filter`], [`reducer_flat_map`],
//!   [`reducer_concat`]
//! - **Composition**: [`pipe`], [`fork`], [`fork_series`], [`assign`]
//! - **Predicates**: [`and`], [`or`], [`not`], [`any`], [`all`], [`eq`],
//!   [`gt`], [`lt`], [`gte`], [`lte`]
//! - **Control**: [`tap`], [`tap_if`], [`try_catch`], [`switch_case`]
//! - **Access**: [`get`], [`lookup`], [`pick`], [`omit`]
//!
//! ## Feature Flags
//!
//! - `serde`: `serde::Serialize` for data-only values
//!
//! ## Example
//!
//! ```rust
//! use shapeflow::prelude::*;
//!
//! let is_odd = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) % 2 == 1));
//! let square = Function::unary(|value: Value| {
//!     let number = value.as_int().unwrap_or(0);
//!     Value::from(number * number)
//! });
//!
//! let squared_odds = pipe([filter(is_odd), map(square)]);
//! let result = squared_odds.call1(Value::array([1, 2, 3, 4, 5])).unwrap();
//! assert_eq!(result.into_immediate(), Some(Value::array([1, 9, 25])));
//!
//! // the same pipeline folds into a set
//! let collected = transform(squared_odds, Value::set(Vec::<Value>::new()))
//!     .call1(Value::array([1, 2, 3, 3]))
//!     .unwrap();
//! assert_eq!(collected.into_immediate(), Some(Value::set([1, 9])));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports the value model, the deferred primitives and every combinator.
///
/// # Usage
///
/// ```rust
/// use shapeflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::combinator::*;
    pub use crate::deferred::{Eventual, Outcome, Pending};
    pub use crate::error::Error;
    pub use crate::reduce::{reduce, reduce_from, reducer_concat};
    pub use crate::shape::{Shape, classify};
    pub use crate::transform::{reducer_filter, reducer_flat_map, reducer_map, transform};
    pub use crate::value::{Args, Foreign, Function, FunctionKind, Value};
}

pub mod combinator;
pub mod deferred;
pub mod error;
pub mod executor;
pub mod reduce;
pub mod shape;
pub mod transform;
pub mod value;

pub use combinator::*;
pub use deferred::{Eventual, InFlight, Outcome, Pending, all_of, race_of};
pub use error::{Error, Result};
pub use reduce::{fold, reduce, reduce_from, reducer_concat};
pub use shape::{Shape, classify};
pub use transform::{accumulate, reducer_filter, reducer_flat_map, reducer_map, transform};
pub use value::{Function, Value};
