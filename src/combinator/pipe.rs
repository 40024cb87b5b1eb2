//! Left-to-right composition.

use std::rc::Rc;

use smallvec::smallvec;

use crate::deferred::{Eventual, Outcome};
use crate::value::{Args, Function, Value};

/// Composes `stages` left to right.
///
/// The first stage receives every argument; each later stage receives the
/// previous stage's result once it has settled. An empty pipeline returns its
/// first argument.
///
/// When the first argument is a plain function (a reducer), the stages are
/// applied right to left instead. That is what makes a pipeline of `map`,
/// `filter` and `flat_map` read left to right when used as a transducer: the
/// first stage is the outermost transformation of the reducer.
///
/// # Examples
///
/// ```rust
/// use shapeflow::pipe;
/// use shapeflow::value::{Function, Value};
///
/// let add_one = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) + 1));
/// let double = Function::unary(|value: Value| Value::from(value.as_int().unwrap_or(0) * 2));
/// let pipeline = pipe([add_one, double]);
/// assert_eq!(pipeline.call1(Value::from(3)).unwrap().into_immediate(), Some(Value::from(8)));
/// ```
pub fn pipe<I>(stages: I) -> Function
where
    I: IntoIterator<Item = Function>,
{
    let stages: Rc<[Function]> = stages.into_iter().collect();
    Function::new(move |args: Args| {
        let transducing = matches!(args.first(), Some(Value::Function(first)) if first.is_plain());
        if transducing {
            run(stages.iter().rev(), args)
        } else {
            run(stages.iter(), args)
        }
    })
}

fn run<'a, I>(mut stages: I, args: Args) -> Outcome
where
    I: Iterator<Item = &'a Function>,
{
    let Some(first) = stages.next() else {
        return Ok(Eventual::Immediate(args.into_iter().next().unwrap_or_default()));
    };
    let mut current = first.call(args)?;
    for stage in stages {
        current = match current {
            Eventual::Immediate(value) => stage.call(smallvec![value])?,
            deferred => {
                let stage = stage.clone();
                deferred.on_resolve(move |value| stage.call1(value))?
            }
        };
    }
    Ok(current)
}
