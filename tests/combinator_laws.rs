//! Property-based tests for the combinator laws.
//!
//! This module verifies the laws every shape-dispatching combinator obeys:
//!
//! - **Identity Law**: `map(identity)(xs) == xs`
//! - **Composition Law**: `map(g)(map(f)(xs)) == map(g ∘ f)(xs)`
//! - **Order Law**: `filter(p)(xs)` is the subsequence of `xs` satisfying `p`
//! - **Deferral Law**: a deferred operator produces what its eager twin does
//! - **Seed Law**: `reduce(r)(xs) == reduce_from(r, xs[0])(xs[1..])`
//! - **Transducer Law**: `transform(map(f), [])(xs) == map(f)(xs)`
//!
//! Using proptest, we generate random inputs to verify these laws across a
//! wide range of collections.

use futures::executor::block_on;
use proptest::prelude::*;
use shapeflow::value::{Function, Value};
use shapeflow::{Outcome, filter, flat_map, map, reduce, reduce_from, transform};

fn immediate(outcome: Outcome) -> Value {
    outcome.unwrap().into_immediate().unwrap()
}

fn settle(outcome: Outcome) -> Value {
    block_on(outcome.unwrap().resolve()).unwrap()
}

fn number(value: &Value) -> i64 {
    value.as_int().unwrap_or(0)
}

fn increment() -> Function {
    Function::unary(|value: Value| Value::from(number(&value).wrapping_add(1)))
}

fn double() -> Function {
    Function::unary(|value: Value| Value::from(number(&value).wrapping_mul(2)))
}

fn is_even() -> Function {
    Function::unary(|value: Value| Value::from(number(&value) % 2 == 0))
}

fn add() -> Function {
    Function::binary(|left: Value, right: Value| {
        Value::from(number(&left).wrapping_add(number(&right)))
    })
}

/// Wraps a synchronous operator so it always defers.
fn deferring(operator: Function) -> Function {
    Function::deferred(move |value: Value| {
        let result = operator.call1(value);
        async move { result?.resolve().await }
    })
}

fn numbers() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 0..32)
}

// =============================================================================
// Elementwise Laws
// =============================================================================

proptest! {
    /// Identity Law for arrays
    #[test]
    fn prop_map_identity_law(items in numbers()) {
        let array = Value::array(items);
        let mapped = immediate(map(Function::unary(|value| value)).call1(array.clone()));
        prop_assert_eq!(mapped, array);
    }

    /// Composition Law for arrays
    #[test]
    fn prop_map_composition_law(items in numbers()) {
        let array = Value::array(items);
        let left = immediate(map(double()).call1(immediate(map(increment()).call1(array.clone()))));
        let composed = Function::unary(|value: Value| {
            Value::from(number(&value).wrapping_add(1).wrapping_mul(2))
        });
        let right = immediate(map(composed).call1(array));
        prop_assert_eq!(left, right);
    }

    /// Map preserves the length of arrays and never grows sets
    #[test]
    fn prop_map_preserves_shape(items in numbers()) {
        let Value::Array(mapped) = immediate(map(increment()).call1(Value::array(items.clone()))) else {
            return Err(TestCaseError::fail("map changed the shape of an array"));
        };
        prop_assert_eq!(mapped.len(), items.len());

        let set = Value::set(items);
        let original = set.as_set().map_or(0, |set| set.len());
        let Value::Set(mapped) = immediate(map(is_even()).call1(set)) else {
            return Err(TestCaseError::fail("map changed the shape of a set"));
        };
        prop_assert!(mapped.len() <= original.min(2));
    }

    /// Order Law: filter keeps a subsequence in input order
    #[test]
    fn prop_filter_order_law(items in numbers()) {
        let kept = immediate(filter(is_even()).call1(Value::array(items.clone())));
        let expected: Vec<i64> = items.into_iter().filter(|item| item % 2 == 0).collect();
        prop_assert_eq!(kept, Value::array(expected));
    }

    /// Flat-mapping to singletons is mapping
    #[test]
    fn prop_flat_map_singleton_law(items in numbers()) {
        let singleton = Function::unary(|value: Value| Value::array([number(&value).wrapping_add(1)]));
        let array = Value::array(items);
        let flattened = immediate(flat_map(singleton).call1(array.clone()));
        prop_assert_eq!(flattened, immediate(map(increment()).call1(array)));
    }
}

// =============================================================================
// Deferral Laws
// =============================================================================

proptest! {
    /// A deferred mapper produces the eager result
    #[test]
    fn prop_deferred_map_law(items in numbers()) {
        let array = Value::array(items);
        let eager = immediate(map(increment()).call1(array.clone()));
        let deferred = settle(map(deferring(increment())).call1(array));
        prop_assert_eq!(deferred, eager);
    }

    /// A deferred predicate produces the eager result
    #[test]
    fn prop_deferred_filter_law(items in numbers()) {
        let array = Value::array(items);
        let eager = immediate(filter(is_even()).call1(array.clone()));
        let deferred = settle(filter(deferring(is_even())).call1(array));
        prop_assert_eq!(deferred, eager);
    }

    /// A deferred reducer produces the eager result
    #[test]
    fn prop_deferred_reduce_law(items in numbers()) {
        let array = Value::array(items);
        let eager = immediate(reduce_from(add(), 0).call1(array.clone()));
        let slow_add = Function::binary_deferred(|left: Value, right: Value| async move {
            Ok(Value::from(number(&left).wrapping_add(number(&right))))
        });
        let deferred = settle(reduce_from(slow_add, 0).call1(array));
        prop_assert_eq!(deferred, eager);
    }
}

// =============================================================================
// Folding Laws
// =============================================================================

proptest! {
    /// Seed Law: the first element is the default seed
    #[test]
    fn prop_seed_law(head in any::<i64>(), tail in numbers()) {
        let mut items = vec![head];
        items.extend(tail.iter().copied());
        let unseeded = immediate(reduce(add()).call1(Value::array(items)));
        let seeded = immediate(reduce_from(add(), head).call1(Value::array(tail)));
        prop_assert_eq!(unseeded, seeded);
    }

    /// Transducer Law: transforming into an empty array is mapping
    #[test]
    fn prop_transducer_law(items in numbers()) {
        let array = Value::array(items);
        let transformed = immediate(
            transform(map(increment()), Value::array(Vec::<Value>::new())).call1(array.clone()),
        );
        prop_assert_eq!(transformed, immediate(map(increment()).call1(array)));
    }
}
