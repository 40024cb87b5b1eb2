//! Fan-out: calling several operators with the same arguments.

use std::rc::Rc;

use smallvec::smallvec;

use crate::deferred::{Eventual, Outcome, Pending};
use crate::error::{Error, Result};
use crate::executor::Assembly;
use crate::value::{Args, Function, Object, Value};

/// The operators a [`fork`] fans out to.
#[derive(Clone, Debug)]
pub enum Branches {
    /// Results are collected into an array, in branch order.
    Ordered(Vec<Function>),
    /// Results are collected into an object under each branch's key.
    Keyed(Vec<(String, Function)>),
}

impl From<Vec<Function>> for Branches {
    fn from(branches: Vec<Function>) -> Self {
        Self::Ordered(branches)
    }
}

impl<const N: usize> From<[Function; N]> for Branches {
    fn from(branches: [Function; N]) -> Self {
        Self::Ordered(branches.into())
    }
}

impl<K: Into<String>> From<Vec<(K, Function)>> for Branches {
    fn from(branches: Vec<(K, Function)>) -> Self {
        Self::Keyed(branches.into_iter().map(|(key, branch)| (key.into(), branch)).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Function); N]> for Branches {
    fn from(branches: [(K, Function); N]) -> Self {
        Self::Keyed(branches.into_iter().map(|(key, branch)| (key.into(), branch)).collect())
    }
}

/// Calls every branch with the same arguments and collects the results.
///
/// All branches are invoked before any deferred result is awaited, so
/// deferred branches run concurrently. Results are placed by branch position
/// (or key), never by completion order.
///
/// # Examples
///
/// ```rust
/// use shapeflow::fork;
/// use shapeflow::value::{Function, Value};
///
/// let greet = |suffix: &'static str| {
///     Function::unary(move |greeting: Value| Value::from(format!("{greeting}{suffix}")))
/// };
/// let greetings = fork([("world", greet(" world")), ("mom", greet(" mom"))]);
/// let result = greetings.call1(Value::from("hello")).unwrap().into_immediate();
/// assert_eq!(
///     result,
///     Some(Value::object([("world", "hello world"), ("mom", "hello mom")]))
/// );
/// ```
pub fn fork(branches: impl Into<Branches>) -> Function {
    match branches.into() {
        Branches::Ordered(branches) => Function::new(move |args| {
            Ok(call_all(branches.iter(), &args)?.map(Value::Array))
        }),
        Branches::Keyed(branches) => {
            let branches: Rc<[(String, Function)]> = branches.into();
            Function::new(move |args| Ok(keyed(&branches, &args)?.map(Value::Object)))
        }
    }
}

fn call_all<'a, I>(branches: I, args: &Args) -> Result<Eventual<Vec<Value>>>
where
    I: ExactSizeIterator<Item = &'a Function>,
{
    let mut assembly = Assembly::with_capacity(branches.len());
    for branch in branches {
        assembly.push(branch.call(args.clone())?);
    }
    Ok(assembly.finish())
}

fn keyed(branches: &Rc<[(String, Function)]>, args: &Args) -> Outcome<Object> {
    let results = call_all(branches.iter().map(|(_, branch)| branch), args)?;
    let branches = Rc::clone(branches);
    Ok(results.map(move |results| {
        branches
            .iter()
            .map(|(key, _)| key.clone())
            .zip(results)
            .collect()
    }))
}

/// Calls every branch in order, waiting for each deferred result before
/// calling the next branch.
///
/// # Examples
///
/// ```rust
/// use shapeflow::fork_series;
/// use shapeflow::value::{Function, Value};
///
/// let both = fork_series([
///     Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) + 1)),
///     Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) * 2)),
/// ]);
/// let result = both.call1(Value::from(5)).unwrap().into_immediate();
/// assert_eq!(result, Some(Value::array([6, 10])));
/// ```
pub fn fork_series<I>(branches: I) -> Function
where
    I: IntoIterator<Item = Function>,
{
    let branches: Rc<[Function]> = branches.into_iter().collect();
    Function::new(move |args| {
        let mut results = Vec::with_capacity(branches.len());
        for (position, branch) in branches.iter().enumerate() {
            match branch.call(args.clone())? {
                Eventual::Immediate(value) => results.push(value),
                Eventual::Deferred(pending) => {
                    let branches = Rc::clone(&branches);
                    return Ok(Eventual::Deferred(Pending::new(async move {
                        results.push(pending.await?);
                        for branch in &branches[position + 1..] {
                            results.push(branch.call(args.clone())?.resolve().await?);
                        }
                        Ok(Value::Array(results))
                    })));
                }
            }
        }
        Ok(Eventual::Immediate(Value::Array(results)))
    })
}

/// Forks an object over keyed branches and merges the results into it.
///
/// Branch results overwrite same-named properties of the input. `null` is
/// treated as an empty object.
///
/// # Errors
///
/// The returned function fails with [`Error::TypeConstraint`] when given
/// anything but an object or `null`.
///
/// # Examples
///
/// ```rust
/// use shapeflow::assign;
/// use shapeflow::value::{Function, Value};
///
/// let squared = Function::unary(|source: Value| {
///     let number = source
///         .as_object()
///         .and_then(|object| object.get("number"))
///         .and_then(Value::as_int)
///         .unwrap_or(0);
///     Value::from(number * number)
/// });
/// let result = assign([("squared", squared)]).call1(Value::object([("number", 3)])).unwrap();
/// assert_eq!(
///     result.into_immediate(),
///     Some(Value::object([("number", 3), ("squared", 9)]))
/// );
/// ```
pub fn assign<I, K>(branches: I) -> Function
where
    I: IntoIterator<Item = (K, Function)>,
    K: Into<String>,
{
    let branches: Rc<[(String, Function)]> = branches
        .into_iter()
        .map(|(key, branch)| (key.into(), branch))
        .collect();
    Function::operator(move |value| {
        let mut merged = match value {
            Value::Object(object) => object,
            Value::Null => Object::new(),
            other => return Err(Error::type_constraint("assign", "an object", other.shape())),
        };
        let args: Args = smallvec![Value::Object(merged.clone())];
        Ok(keyed(&branches, &args)?.map(move |results| {
            merged.extend(results);
            Value::Object(merged)
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use rstest::rstest;
    use std::cell::RefCell;

    fn times(factor: i64) -> Function {
        Function::unary(move |value| Value::from(value.as_int().unwrap_or(0) * factor))
    }

    #[rstest]
    fn test_ordered_fork_collects_array() {
        let result = fork([times(1), times(2), times(3)]).call1(Value::from(2)).unwrap();
        assert_eq!(result.into_immediate(), Some(Value::array([2, 4, 6])));
    }

    #[rstest]
    fn test_nested_fork() {
        let nested = fork(vec![("inner", fork([times(10)]))]);
        let result = nested.call1(Value::from(1)).unwrap();
        assert_eq!(
            result.into_immediate(),
            Some(Value::object([("inner", Value::array([10]))]))
        );
    }

    #[rstest]
    fn test_deferred_branches_keep_positions() {
        let slow = Function::deferred(|value: Value| async move { Ok(value) });
        let result = fork([slow, times(2)]).call1(Value::from(4)).unwrap();
        assert!(result.is_pending());
        assert_eq!(block_on(result.resolve()).unwrap(), Value::array([4, 8]));
    }

    #[rstest]
    fn test_fork_series_waits_before_next_branch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first_log = Rc::clone(&log);
        let first = Function::deferred(move |value: Value| {
            let log = Rc::clone(&first_log);
            async move {
                log.borrow_mut().push("first settled");
                Ok(value)
            }
        });
        let second_log = Rc::clone(&log);
        let second = Function::unary(move |value| {
            second_log.borrow_mut().push("second called");
            value
        });
        let result = fork_series([first, second]).call1(Value::from(1)).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(block_on(result.resolve()).unwrap(), Value::array([1, 1]));
        assert_eq!(*log.borrow(), vec!["first settled", "second called"]);
    }

    #[rstest]
    fn test_assign_overwrites_and_accepts_null() {
        let constant = Function::unary(|_| Value::from("new"));
        let assigning = assign([("a", constant)]);
        let merged = assigning.call1(Value::object([("a", "old"), ("b", "kept")])).unwrap();
        assert_eq!(
            merged.into_immediate(),
            Some(Value::object([("a", "new"), ("b", "kept")]))
        );
        let from_null = assigning.call1(Value::Null).unwrap();
        assert_eq!(from_null.into_immediate(), Some(Value::object([("a", "new")])));
    }

    #[rstest]
    fn test_assign_rejects_arrays() {
        let error = assign([("a", times(1))]).call1(Value::array([1])).unwrap_err();
        assert!(matches!(error, Error::TypeConstraint { combinator: "assign", .. }));
    }
}
