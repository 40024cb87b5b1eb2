//! The combinators.
//!
//! Every combinator takes its operators up front and returns a [`Function`]
//! that is then called with the value to work on, so combinators compose
//! with [`pipe`] and nest inside each other freely.
//!
//! - [`map`], [`filter`] and [`flat_map`] dispatch on the shape of their
//!   argument and preserve it; handed a reducer instead of a collection they
//!   return a transformed reducer
//! - [`pipe`], [`fork`], [`fork_series`] and [`assign`] compose operators
//! - [`and`], [`or`], [`not`], [`any`], [`all`] and the comparisons produce
//!   booleans
//! - [`tap`], [`tap_if`], [`try_catch`] and [`switch_case`] steer control flow
//! - [`get`], [`lookup`], [`pick`] and [`omit`] read properties by path
//!
//! [`Function`]: crate::value::Function

mod access;
mod compare;
mod control;
mod filter;
mod flat_map;
mod fork;
mod map;
mod pipe;
mod predicate;

pub use access::{
    DEFAULT_PATH_CACHE_CAPACITY, Path, PathCache, get, lookup, lookup_with_cache, omit, pick,
};
pub use compare::{eq, gt, gte, lt, lte};
pub use control::{switch_case, tap, tap_if, try_catch};
pub use filter::{filter, filter_with_index};
pub use flat_map::flat_map;
pub use fork::{Branches, assign, fork, fork_series};
pub use map::{map, map_pool, map_series, map_with_index};
pub use pipe::pipe;
pub use predicate::{QUANTIFIER_CONCURRENCY, all, and, any, not, or};
