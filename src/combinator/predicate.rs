//! Logical combinators and quantifiers.
//!
//! Every combinator here produces `Value::Bool`. Predicate results are judged
//! by truthiness, and evaluation stops as soon as the outcome is decided.

use std::rc::Rc;

use futures::StreamExt;

use crate::deferred::{Eventual, InFlight, Outcome, Pending};
use crate::error::Result;
use crate::value::{Capabilities, Function, PullStream, Value};

/// Bound on predicates in flight while testing an asynchronous pull sequence.
pub const QUANTIFIER_CONCURRENCY: usize = 20;

// =============================================================================
// Connectives
// =============================================================================

/// Tests a value against every predicate in order, stopping at the first
/// falsy result. Later predicates are not called once one fails, even when
/// an earlier one deferred.
///
/// # Examples
///
/// ```rust
/// use shapeflow::and;
/// use shapeflow::value::{Function, Value};
///
/// let positive = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) > 0));
/// let even = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(1) % 2 == 0));
/// let both = and([positive, even]);
/// assert_eq!(both.call1(Value::from(4)).unwrap().into_immediate(), Some(Value::from(true)));
/// assert_eq!(both.call1(Value::from(3)).unwrap().into_immediate(), Some(Value::from(false)));
/// ```
pub fn and<I>(predicates: I) -> Function
where
    I: IntoIterator<Item = Function>,
{
    connective(predicates, false)
}

/// Tests a value against every predicate in order, stopping at the first
/// truthy result.
pub fn or<I>(predicates: I) -> Function
where
    I: IntoIterator<Item = Function>,
{
    connective(predicates, true)
}

/// Builds a connective that stops at the first verdict whose truthiness is
/// `decisive`, returning it; exhausting the predicates returns `!decisive`.
fn connective<I>(predicates: I, decisive: bool) -> Function
where
    I: IntoIterator<Item = Function>,
{
    let predicates: Rc<[Function]> = predicates.into_iter().collect();
    Function::operator(move |value| {
        for (position, predicate) in predicates.iter().enumerate() {
            match predicate.call1(value.clone())? {
                Eventual::Immediate(verdict) => {
                    if verdict.is_truthy() == decisive {
                        return Ok(Eventual::Immediate(Value::Bool(decisive)));
                    }
                }
                Eventual::Deferred(pending) => {
                    let predicates = Rc::clone(&predicates);
                    return Ok(Eventual::Deferred(Pending::new(async move {
                        if pending.await?.is_truthy() == decisive {
                            return Ok(Value::Bool(decisive));
                        }
                        for predicate in &predicates[position + 1..] {
                            let verdict = predicate.call1(value.clone())?.resolve().await?;
                            if verdict.is_truthy() == decisive {
                                return Ok(Value::Bool(decisive));
                            }
                        }
                        Ok(Value::Bool(!decisive))
                    })));
                }
            }
        }
        Ok(Eventual::Immediate(Value::Bool(!decisive)))
    })
}

/// Negates the truthiness of `predicate`'s result.
///
/// # Examples
///
/// ```rust
/// use shapeflow::not;
/// use shapeflow::value::{Function, Value};
///
/// let empty = not(Function::unary(|value: Value| value));
/// assert_eq!(empty.call1(Value::from("")).unwrap().into_immediate(), Some(Value::from(true)));
/// ```
pub fn not(predicate: Function) -> Function {
    Function::new(move |args| {
        Ok(predicate
            .call(args)?
            .map(|verdict| Value::Bool(!verdict.is_truthy())))
    })
}

// =============================================================================
// Quantifiers
// =============================================================================

#[derive(Clone, Copy, Debug)]
enum Quantifier {
    Any,
    All,
}

impl Quantifier {
    /// Returns the answer a verdict forces, if any.
    const fn decided_by(self, truthy: bool) -> Option<bool> {
        match (self, truthy) {
            (Self::Any, true) => Some(true),
            (Self::All, false) => Some(false),
            _ => None,
        }
    }

    /// The answer when no verdict forced one.
    const fn exhausted(self) -> bool {
        matches!(self, Self::All)
    }
}

/// Tests whether any element satisfies `predicate`.
///
/// Elements of collections and synchronous pull sequences all get a
/// predicate call before any deferred verdict is awaited; deferred verdicts
/// are then raced, and the first truthy one decides. Asynchronous pull
/// sequences keep at most [`QUANTIFIER_CONCURRENCY`] verdicts in flight.
/// `null` and scalars are tested directly.
///
/// # Examples
///
/// ```rust
/// use shapeflow::any;
/// use shapeflow::value::{Function, Value};
///
/// let negative = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) < 0));
/// let found = any(negative).call1(Value::set([3, -1, 4])).unwrap();
/// assert_eq!(found.into_immediate(), Some(Value::from(true)));
/// ```
pub fn any(predicate: Function) -> Function {
    quantify(predicate, Quantifier::Any)
}

/// Tests whether every element satisfies `predicate`.
///
/// Evaluation follows [`any`], stopping at the first falsy verdict. Empty
/// collections satisfy every predicate.
pub fn all(predicate: Function) -> Function {
    quantify(predicate, Quantifier::All)
}

fn quantify(predicate: Function, quantifier: Quantifier) -> Function {
    Function::operator(move |value| quantify_value(value, &predicate, quantifier))
}

fn quantify_value(value: Value, predicate: &Function, quantifier: Quantifier) -> Outcome {
    let value = match value.into_elements() {
        Ok(elements) => return quantify_elements(elements, predicate, quantifier),
        Err(value) => value,
    };
    match value {
        Value::Stream(stream) => Ok(Eventual::Deferred(quantify_stream(
            stream,
            predicate.clone(),
            quantifier,
        ))),
        Value::Foreign(foreign) if foreign.capabilities().contains(Capabilities::REDUCE) => {
            foreign.reduce(
                &quantifying_reducer(predicate.clone(), quantifier),
                Some(Value::Bool(quantifier.exhausted())),
            )
        }
        other => Ok(predicate
            .call1(other)?
            .map(|verdict| Value::Bool(verdict.is_truthy()))),
    }
}

fn quantify_elements<I>(elements: I, predicate: &Function, quantifier: Quantifier) -> Outcome
where
    I: Iterator<Item = Result<Value>>,
{
    let mut in_flight = InFlight::new();
    for (position, element) in elements.enumerate() {
        match predicate.call1(element?)? {
            Eventual::Immediate(verdict) => {
                if let Some(answer) = quantifier.decided_by(verdict.is_truthy()) {
                    return Ok(Eventual::Immediate(Value::Bool(answer)));
                }
            }
            Eventual::Deferred(pending) => in_flight.admit(position, pending),
        }
    }
    if in_flight.is_empty() {
        return Ok(Eventual::Immediate(Value::Bool(quantifier.exhausted())));
    }
    Ok(Eventual::Deferred(Pending::new(async move {
        let answer = race(&mut in_flight, quantifier, 0).await?;
        Ok(Value::Bool(answer.unwrap_or_else(|| quantifier.exhausted())))
    })))
}

/// Settles in-flight verdicts until at most `keep` remain, returning early
/// with the answer if one of them forces it.
async fn race(in_flight: &mut InFlight, quantifier: Quantifier, keep: usize) -> Result<Option<bool>> {
    while in_flight.len() > keep {
        let Some((_, verdict)) = in_flight.settle_next().await else {
            break;
        };
        if let Some(answer) = quantifier.decided_by(verdict?.is_truthy()) {
            return Ok(Some(answer));
        }
    }
    Ok(None)
}

fn quantify_stream(mut stream: PullStream, predicate: Function, quantifier: Quantifier) -> Pending {
    Pending::new(async move {
        let mut in_flight = InFlight::new();
        let mut position = 0;
        while let Some(element) = stream.next().await {
            if in_flight.len() >= QUANTIFIER_CONCURRENCY
                && let Some(answer) = race(&mut in_flight, quantifier, QUANTIFIER_CONCURRENCY - 1).await?
            {
                return Ok(Value::Bool(answer));
            }
            match predicate.call1(element?)? {
                Eventual::Immediate(verdict) => {
                    if let Some(answer) = quantifier.decided_by(verdict.is_truthy()) {
                        return Ok(Value::Bool(answer));
                    }
                }
                Eventual::Deferred(pending) => in_flight.admit(position, pending),
            }
            position += 1;
        }
        let answer = race(&mut in_flight, quantifier, 0).await?;
        Ok(Value::Bool(answer.unwrap_or_else(|| quantifier.exhausted())))
    })
}

/// Reducer for foreign folds: carries the answer once it is forced and tests
/// the next element otherwise.
fn quantifying_reducer(predicate: Function, quantifier: Quantifier) -> Function {
    Function::reducer(move |accumulator, element| {
        if quantifier.decided_by(accumulator.is_truthy()).is_some() {
            return Ok(Eventual::Immediate(accumulator));
        }
        Ok(predicate
            .call1(element)?
            .map(|verdict| Value::Bool(verdict.is_truthy())))
    })
}
