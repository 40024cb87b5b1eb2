//! Control flow: effects, error recovery and branching.

use std::rc::Rc;

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::Error;
use crate::value::{Args, Function, Value};

fn first_argument(args: &Args) -> Value {
    args.first().cloned().unwrap_or_default()
}

/// Calls `effect` for its side effects and returns the first argument.
///
/// A deferred effect is waited for before the argument is handed on, so a
/// tap in a [`pipe`](crate::pipe) finishes before the next stage starts.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use shapeflow::tap;
/// use shapeflow::value::{Function, Value};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = Rc::clone(&seen);
/// let logging = tap(Function::unary(move |value: Value| {
///     log.borrow_mut().push(value.to_string());
///     Value::Null
/// }));
/// let passed = logging.call1(Value::from("foo")).unwrap().into_immediate();
/// assert_eq!(passed, Some(Value::from("foo")));
/// assert_eq!(*seen.borrow(), vec!["foo".to_owned()]);
/// ```
pub fn tap(effect: Function) -> Function {
    Function::new(move |args| run_effect(&effect, args))
}

fn run_effect(effect: &Function, args: Args) -> Outcome {
    let passed = first_argument(&args);
    Ok(effect.call(args)?.map(move |_| passed))
}

/// Calls `effect` only when `predicate` accepts the arguments, always
/// returning the first argument.
pub fn tap_if(predicate: Function, effect: Function) -> Function {
    Function::new(move |args| {
        let effect = effect.clone();
        predicate.call(args.clone())?.on_resolve(move |verdict| {
            if verdict.is_truthy() {
                run_effect(&effect, args)
            } else {
                Ok(Eventual::Immediate(first_argument(&args)))
            }
        })
    })
}

/// Calls `tryer`, handing any failure to `catcher` together with the
/// original arguments.
///
/// Both synchronous errors and rejected deferred results are caught. The
/// catcher's own result (or failure) becomes the result.
///
/// # Examples
///
/// ```rust
/// use shapeflow::{Eventual, Error, try_catch};
/// use shapeflow::value::{Function, Value};
///
/// let parse = Function::fallible(|value: Value| {
///     value
///         .as_str()
///         .and_then(|text| text.parse::<i64>().ok())
///         .map(Value::from)
///         .ok_or_else(|| Error::msg("not a number"))
/// });
/// let lenient = try_catch(parse, |error, _| {
///     Ok(Eventual::Immediate(Value::from(error.to_string())))
/// });
/// assert_eq!(
///     lenient.call1(Value::from("x")).unwrap().into_immediate(),
///     Some(Value::from("not a number"))
/// );
/// ```
pub fn try_catch<C>(tryer: Function, catcher: C) -> Function
where
    C: Fn(Error, Args) -> Outcome + 'static,
{
    let catcher = Rc::new(catcher);
    Function::new(move |args: Args| match tryer.call(args.clone()) {
        Ok(Eventual::Immediate(value)) => Ok(Eventual::Immediate(value)),
        Ok(Eventual::Deferred(pending)) => {
            let catcher = Rc::clone(&catcher);
            Ok(Eventual::Deferred(Pending::new(async move {
                match pending.await {
                    Ok(value) => Ok(value),
                    Err(error) => catcher(error, args)?.resolve().await,
                }
            })))
        }
        Err(error) => catcher(error, args),
    })
}

/// Branches over alternating predicates and resolvers.
///
/// `cases` reads `[predicate, resolver, predicate, resolver, …, default]`.
/// The resolver after the first accepting predicate is called with the same
/// arguments; predicates after it are not called. With no accepting
/// predicate the trailing default is called, and without a default the
/// result is `null`.
///
/// # Examples
///
/// ```rust
/// use shapeflow::{gt, switch_case};
/// use shapeflow::value::{Function, Value};
///
/// let identity = Function::unary(|value| value);
/// let describe = switch_case([
///     gt(identity.clone(), 0),
///     Function::unary(|_| Value::from("positive")),
///     Function::unary(|_| Value::from("not positive")),
/// ]);
/// assert_eq!(
///     describe.call1(Value::from(4)).unwrap().into_immediate(),
///     Some(Value::from("positive"))
/// );
/// ```
pub fn switch_case<I>(cases: I) -> Function
where
    I: IntoIterator<Item = Function>,
{
    let cases: Rc<[Function]> = cases.into_iter().collect();
    Function::new(move |args| switch_from(&cases, 0, args))
}

fn switch_from(cases: &Rc<[Function]>, start: usize, args: Args) -> Outcome {
    let mut position = start;
    while position + 1 < cases.len() {
        match cases[position].call(args.clone())? {
            Eventual::Immediate(verdict) => {
                if verdict.is_truthy() {
                    return cases[position + 1].call(args);
                }
            }
            Eventual::Deferred(pending) => {
                let cases = Rc::clone(cases);
                return Eventual::Deferred(pending).on_resolve(move |verdict| {
                    if verdict.is_truthy() {
                        cases[position + 1].call(args)
                    } else {
                        switch_from(&cases, position + 2, args)
                    }
                });
            }
        }
        position += 2;
    }
    match cases.get(position) {
        Some(default) => default.call(args),
        None => Ok(Eventual::Immediate(Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use rstest::rstest;
    use std::cell::Cell;

    fn settle(outcome: Outcome) -> Value {
        block_on(outcome.unwrap().resolve()).unwrap()
    }

    fn constant(value: &'static str) -> Function {
        Function::unary(move |_| Value::from(value))
    }

    fn above(bound: i64) -> Function {
        Function::unary(move |value| Value::from(value.as_int().unwrap_or(0) > bound))
    }

    fn slow_above(bound: i64) -> Function {
        Function::deferred(move |value: Value| async move {
            Ok(Value::from(value.as_int().unwrap_or(0) > bound))
        })
    }

    #[rstest]
    fn test_tap_waits_for_deferred_effect() {
        let settled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&settled);
        let effect = Function::deferred(move |_| {
            let flag = Rc::clone(&flag);
            async move {
                flag.set(true);
                Ok(Value::Null)
            }
        });
        let passed = tap(effect).call1(Value::from(7)).unwrap();
        assert!(passed.is_pending());
        assert_eq!(block_on(passed.resolve()).unwrap(), Value::from(7));
        assert!(settled.get());
    }

    #[rstest]
    #[case(Value::from(5), 1)]
    #[case(Value::from(-5), 0)]
    fn test_tap_if_calls_effect_conditionally(#[case] input: Value, #[case] expected_calls: usize) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let effect = Function::unary(move |_| {
            counter.set(counter.get() + 1);
            Value::Null
        });
        let passed = settle(tap_if(slow_above(0), effect).call1(input.clone()));
        assert_eq!(passed, input);
        assert_eq!(calls.get(), expected_calls);
    }

    #[rstest]
    fn test_try_catch_recovers_rejected_results() {
        let failing = Function::deferred(|_| async { Err::<Value, _>(Error::msg("boom")) });
        let recovered = try_catch(failing, |error, args| {
            Ok(Eventual::Immediate(Value::array([
                Value::from(error.to_string()),
                args.first().cloned().unwrap_or_default(),
            ])))
        });
        assert_eq!(
            settle(recovered.call1(Value::from(1))),
            Value::array([Value::from("boom"), Value::from(1)])
        );
    }

    #[rstest]
    fn test_try_catch_passes_successes_through() {
        let recovered = try_catch(constant("fine"), |_, _| Err(Error::msg("unreachable")));
        assert_eq!(settle(recovered.call1(Value::Null)), Value::from("fine"));
    }

    #[rstest]
    #[case(Value::from(20), "big")]
    #[case(Value::from(5), "medium")]
    #[case(Value::from(0), "small")]
    fn test_switch_case_with_deferred_predicates(#[case] input: Value, #[case] expected: &str) {
        let sizing = switch_case([
            slow_above(10),
            constant("big"),
            above(1),
            constant("medium"),
            constant("small"),
        ]);
        assert_eq!(settle(sizing.call1(input)), Value::from(expected));
    }

    #[rstest]
    fn test_switch_case_without_default_is_null() {
        let sizing = switch_case([above(10), constant("big")]);
        assert_eq!(settle(sizing.call1(Value::from(1))), Value::Null);
    }
}
