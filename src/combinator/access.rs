//! Property access by path.
//!
//! A [`Path`] is a list of segments. Strings parse as dot and bracket paths
//! (`"a[0].b"` is `["a", "0", "b"]`); integers are single index segments.
//! Each segment looks up an object property, an array index, a mapping key or
//! a character of text. Missing properties and `null` along the way resolve
//! to `null`.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::deferred::{Eventual, Outcome};
use crate::error::Error;
use crate::value::{Function, Object, Value};

/// Number of parsed paths a [`PathCache`] keeps by default.
pub const DEFAULT_PATH_CACHE_CAPACITY: usize = 500;

// =============================================================================
// Path
// =============================================================================

/// A parsed property path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    segments: SmallVec<[String; 4]>,
}

impl Path {
    /// Parses a dot and bracket path string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::Path;
    ///
    /// let path = Path::parse("users[0].name");
    /// assert_eq!(path.segments().collect::<Vec<_>>(), vec!["users", "0", "name"]);
    /// ```
    pub fn parse(path: &str) -> Self {
        path.split(['.', '|', '[', ']'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Returns the segments in lookup order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the empty path, which resolves to its source.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Follows the path from `source`, returning `None` where it ends in
    /// nothing.
    pub fn resolve<'a>(&self, source: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(source, |current, segment| step(current, segment))
            .filter(|found| !found.is_null())
    }
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(object) => object.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        Value::Map(entries) => entries.get(&Value::from(segment)).or_else(|| {
            let index: i64 = segment.parse().ok()?;
            entries.get(&Value::from(index))
        }),
        _ => None,
    }
}

/// Like [`step`], but also indexes text, which has no borrowed element.
fn step_owned(current: &Value, segment: &str) -> Option<Value> {
    match current {
        Value::Str(text) => {
            let position: usize = segment.parse().ok()?;
            text.chars().nth(position).map(Value::from)
        }
        other => step(other, segment).cloned(),
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(segments: I) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<usize> for Path {
    fn from(index: usize) -> Self {
        std::iter::once(index.to_string()).collect()
    }
}

impl From<i64> for Path {
    fn from(index: i64) -> Self {
        std::iter::once(index.to_string()).collect()
    }
}

impl From<Vec<&str>> for Path {
    fn from(segments: Vec<&str>) -> Self {
        segments.into_iter().map(str::to_owned).collect()
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        segments.into_iter().map(str::to_owned).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join("."))
    }
}

/// Reads `source` along `path`, indexing into text as well.
fn read(source: &Value, path: &Path) -> Value {
    let Some((last, parents)) = path.segments.split_last() else {
        return source.clone();
    };
    parents
        .iter()
        .try_fold(source, |current, segment| step(current, segment))
        .and_then(|parent| step_owned(parent, last))
        .unwrap_or_default()
}

// =============================================================================
// PathCache
// =============================================================================

/// A bounded memo of parsed path strings.
///
/// Once full, the cache is cleared before the next new path is stored.
pub struct PathCache {
    parsed: FxHashMap<String, Path>,
    capacity: usize,
}

impl PathCache {
    /// Creates a cache holding [`DEFAULT_PATH_CACHE_CAPACITY`] paths.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PATH_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` paths (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parsed: FxHashMap::default(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the parsed form of `path`, parsing it on a miss.
    pub fn resolve(&mut self, path: &str) -> Path {
        if let Some(parsed) = self.parsed.get(path) {
            return parsed.clone();
        }
        if self.parsed.len() >= self.capacity {
            self.parsed.clear();
        }
        let parsed = Path::parse(path);
        self.parsed.insert(path.to_owned(), parsed.clone());
        parsed
    }

    /// Returns the number of cached paths.
    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    /// Returns the most paths held at once.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PathCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PathCache")
            .field("len", &self.parsed.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Combinators
// =============================================================================

/// Reads a value along `path`, falling back to `default` when it resolves to
/// `null`.
///
/// A function `default` is called with the source to compute the fallback.
///
/// # Examples
///
/// ```rust
/// use shapeflow::get;
/// use shapeflow::value::Value;
///
/// let source = Value::object([("users", Value::array([Value::object([("name", "ada")])]))]);
/// let name = get("users[0].name", Value::Null).call1(source.clone()).unwrap();
/// assert_eq!(name.into_immediate(), Some(Value::from("ada")));
///
/// let missing = get("users[1].name", "nobody").call1(source).unwrap();
/// assert_eq!(missing.into_immediate(), Some(Value::from("nobody")));
/// ```
pub fn get(path: impl Into<Path>, default: impl Into<Value>) -> Function {
    let path = path.into();
    let default = default.into();
    Function::operator(move |source| {
        let found = read(&source, &path);
        if !found.is_null() {
            return Ok(Eventual::Immediate(found));
        }
        match &default {
            Value::Function(fallback) => fallback.call1(source),
            fixed => Ok(Eventual::Immediate(fixed.clone())),
        }
    })
}

/// Binds `source` and returns a function reading it along the path it is
/// called with.
///
/// Path strings are parsed through a [`PathCache`] owned by the returned
/// function. Integer arguments are single index segments and arrays of
/// strings are segment lists.
///
/// # Examples
///
/// ```rust
/// use shapeflow::lookup;
/// use shapeflow::value::Value;
///
/// let config = lookup(Value::object([("server", Value::object([("port", 8080)]))]));
/// let port = config.call1(Value::from("server.port")).unwrap();
/// assert_eq!(port.into_immediate(), Some(Value::from(8080)));
/// ```
pub fn lookup(source: impl Into<Value>) -> Function {
    lookup_with_cache(source, PathCache::new())
}

/// [`lookup`] with an explicitly sized path cache.
pub fn lookup_with_cache(source: impl Into<Value>, cache: PathCache) -> Function {
    let source = source.into();
    let cache = RefCell::new(cache);
    Function::operator(move |path| {
        let path = match path {
            Value::Str(path) => cache.borrow_mut().resolve(&path),
            Value::Int(index) => Path::from(index),
            Value::Array(segments) => segments.iter().map(ToString::to_string).collect(),
            other => return Err(Error::type_constraint("lookup", "a path", other.shape())),
        };
        Ok(Eventual::Immediate(read(&source, &path)))
    })
}

/// Copies the named properties of an object into a new object, skipping
/// those that are missing or `null`. `null` passes through.
///
/// # Errors
///
/// The returned function fails with [`Error::TypeConstraint`] when given
/// anything but an object or `null`.
///
/// # Examples
///
/// ```rust
/// use shapeflow::pick;
/// use shapeflow::value::Value;
///
/// let picked = pick(["a", "c"]).call1(Value::object([("a", 1), ("b", 2)])).unwrap();
/// assert_eq!(picked.into_immediate(), Some(Value::object([("a", 1)])));
/// ```
pub fn pick<I, K>(keys: I) -> Function
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    Function::operator(move |source| {
        let object = match source {
            Value::Object(object) => object,
            Value::Null => return Ok(Eventual::Immediate(Value::Null)),
            other => return Err(Error::type_constraint("pick", "an object", other.shape())),
        };
        let picked: Object = keys
            .iter()
            .filter_map(|key| {
                object
                    .get(key.as_str())
                    .filter(|value| !value.is_null())
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect();
        Ok(Eventual::Immediate(Value::Object(picked)))
    })
}

/// Copies an object without the named properties. `null` passes through.
///
/// # Errors
///
/// The returned function fails with [`Error::TypeConstraint`] when given
/// anything but an object or `null`.
pub fn omit<I, K>(keys: I) -> Function
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    Function::operator(move |source| -> Outcome {
        match source {
            Value::Object(mut object) => {
                for key in &keys {
                    object.remove(key.as_str());
                }
                Ok(Eventual::Immediate(Value::Object(object)))
            }
            Value::Null => Ok(Eventual::Immediate(Value::Null)),
            other => Err(Error::type_constraint("omit", "an object", other.shape())),
        }
    })
}
