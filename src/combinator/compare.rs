//! Comparison combinators.
//!
//! Each side of a comparison is either a fixed value or a resolver: a
//! [`Value::Function`] operand is called with the comparison's arguments and
//! its (possibly deferred) result is compared instead. Both resolvers are
//! called before either result is awaited.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::deferred::{Eventual, Outcome, all_of};
use crate::value::{Args, Function, Value};

enum Operand {
    Fixed(Value),
    Resolver(Function),
}

impl Operand {
    fn new(value: Value) -> Self {
        match value {
            Value::Function(resolver) => Self::Resolver(resolver),
            fixed => Self::Fixed(fixed),
        }
    }

    fn resolve(&self, args: &Args) -> Outcome {
        match self {
            Self::Fixed(value) => Ok(Eventual::Immediate(value.clone())),
            Self::Resolver(resolver) => resolver.call(args.clone()),
        }
    }
}

fn comparing<F>(left: Value, right: Value, test: F) -> Function
where
    F: Fn(&Value, &Value) -> bool + 'static,
{
    let left = Operand::new(left);
    let right = Operand::new(right);
    let test = Rc::new(test);
    Function::new(move |args| {
        let sides = all_of(vec![left.resolve(&args)?, right.resolve(&args)?]);
        let test = Rc::clone(&test);
        Ok(sides.map(move |sides| match sides.as_slice() {
            [left, right] => Value::Bool(test(left, right)),
            _ => Value::Bool(false),
        }))
    })
}

/// Tests two operands for equality.
///
/// # Examples
///
/// ```rust
/// use shapeflow::eq;
/// use shapeflow::value::{Function, Value};
///
/// let length = Function::unary(|value: Value| {
///     Value::from(value.as_str().map_or(0, str::len))
/// });
/// let is_three_long = eq(length, 3);
/// assert_eq!(
///     is_three_long.call1(Value::from("abc")).unwrap().into_immediate(),
///     Some(Value::from(true))
/// );
/// ```
pub fn eq(left: impl Into<Value>, right: impl Into<Value>) -> Function {
    comparing(left.into(), right.into(), |left, right| left == right)
}

fn ordered(left: Value, right: Value, accept: fn(Ordering) -> bool) -> Function {
    comparing(left, right, move |left, right| left.compare(right).is_some_and(accept))
}

/// Tests whether the left operand is greater than the right one.
///
/// Operands without an order between them (a number and text, say) compare
/// false under every ordering combinator.
pub fn gt(left: impl Into<Value>, right: impl Into<Value>) -> Function {
    ordered(left.into(), right.into(), Ordering::is_gt)
}

/// Tests whether the left operand is less than the right one.
pub fn lt(left: impl Into<Value>, right: impl Into<Value>) -> Function {
    ordered(left.into(), right.into(), Ordering::is_lt)
}

/// Tests whether the left operand is greater than or equal to the right one.
pub fn gte(left: impl Into<Value>, right: impl Into<Value>) -> Function {
    ordered(left.into(), right.into(), Ordering::is_ge)
}

/// Tests whether the left operand is less than or equal to the right one.
pub fn lte(left: impl Into<Value>, right: impl Into<Value>) -> Function {
    ordered(left.into(), right.into(), Ordering::is_le)
}
