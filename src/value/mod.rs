//! Runtime values of unknown shape.
//!
//! Every combinator in this crate accepts and produces [`Value`]. A value is a
//! closed tagged union over the containers the engine knows how to traverse
//! (arrays, sets, mappings, plain objects, text, byte buffers, pull
//! sequences), plain scalars, callables, and [`Foreign`] values that expose
//! their own traversal capabilities.
//!
//! # Equality
//!
//! Values compare with *same-value-zero* semantics: `NaN` equals `NaN`,
//! negative zero equals positive zero, and integral floats equal the matching
//! integer. Containers compare structurally. Functions, pull sequences and
//! foreign values compare by identity. [`Hash`] is consistent with equality,
//! so any value can be a set member or mapping key.
//!
//! # Examples
//!
//! ```rust
//! use shapeflow::Value;
//!
//! let array = Value::array([1, 2, 3]);
//! assert_eq!(array.to_string(), "1,2,3");
//! assert_eq!(Value::from(1), Value::from(1.0));
//! assert!(!Value::from("").is_truthy());
//! ```

mod foreign;
mod function;
mod ordered;
mod sequence;
#[cfg(feature = "serde")]
mod serialize;

pub use foreign::{Capabilities, Foreign};
pub use function::{Args, Function, FunctionKind};
pub use ordered::{Object, OrderedMap, ValueMap, ValueSet};
pub use sequence::{PullIter, PullStream};

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use futures::Stream;

use crate::error::Result;
use crate::shape::{Shape, classify};

/// A dynamically shaped value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Text, traversed one character at a time.
    Str(String),
    /// A byte buffer, traversed as integers.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    Array(Vec<Value>),
    /// An unordered set that iterates in insertion order.
    Set(ValueSet),
    /// A key-ordered mapping with arbitrary keys.
    Map(ValueMap),
    /// A plain keyed object with text keys.
    Object(Object),
    /// A callable.
    Function(Function),
    /// A synchronous pull sequence.
    Iter(PullIter),
    /// An asynchronous pull sequence.
    Stream(PullStream),
    /// A value that provides its own traversal capabilities.
    Foreign(Rc<dyn Foreign>),
}

/// Element iterator over a foldable value.
pub(crate) type Elements = Box<dyn Iterator<Item = Result<Value>>>;

impl Value {
    /// Builds an array from anything convertible into values.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set from anything convertible into values.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a plain object from key/value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shapeflow::Value;
    ///
    /// let object = Value::object([("a", 1), ("b", 2)]);
    /// assert_eq!(object.as_object().map(|object| object.len()), Some(2));
    /// ```
    pub fn object<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Self>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds a mapping from key/value pairs.
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<Self>,
        T: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds a byte buffer.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Builds a synchronous pull sequence over `values`.
    pub fn iter<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        I::IntoIter: 'static,
    {
        Self::Iter(PullIter::from_values(values))
    }

    /// Builds an asynchronous pull sequence over `values`.
    pub fn stream<S>(values: S) -> Self
    where
        S: Stream<Item = Self> + 'static,
    {
        Self::Stream(PullStream::from_values(values))
    }

    /// Wraps a value that provides its own traversal capabilities.
    pub fn foreign<F>(foreign: F) -> Self
    where
        F: Foreign + 'static,
    {
        Self::Foreign(Rc::new(foreign))
    }

    /// Returns the shape this value is dispatched on.
    pub fn shape(&self) -> Shape {
        classify(self)
    }

    /// Returns `true` for [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness: `null`, `false`, zero, `NaN` and empty text are falsy.
    ///
    /// Every container and callable is truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(flag) => *flag,
            Self::Int(number) => *number != 0,
            Self::Float(number) => *number != 0.0 && !number.is_nan(),
            Self::Str(text) => !text.is_empty(),
            _ => true,
        }
    }

    /// Returns the boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the number as a float, if this is a number.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(number) => Some(*number as f64),
            Self::Float(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the set, if this is a set.
    pub const fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Returns the mapping, if this is a mapping.
    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the object, if this is a plain object.
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the callable, if this is one.
    pub const fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Consumes the value, returning its elements if it is an array.
    pub fn into_array(self) -> Option<Vec<Self>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value, returning the callable if it is one.
    pub fn into_function(self) -> Option<Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Orders numbers, text and booleans. Other pairs are unordered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    /// use shapeflow::Value;
    ///
    /// assert_eq!(Value::from(1).compare(&Value::from(2.5)), Some(Ordering::Less));
    /// assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
    /// assert_eq!(Value::from(1).compare(&Value::from("1")), None);
    /// ```
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(left), Self::Int(right)) => Some(left.cmp(right)),
            (Self::Str(left), Self::Str(right)) => Some(left.cmp(right)),
            (Self::Bool(left), Self::Bool(right)) => Some(left.cmp(right)),
            _ => self.as_float()?.partial_cmp(&other.as_float()?),
        }
    }

    /// Splits a foldable value into its elements.
    ///
    /// Mappings yield `[key, value]` pairs, objects yield their values, text
    /// yields one-character strings and byte buffers yield integers. Values
    /// that are not synchronously foldable are handed back unchanged.
    pub(crate) fn into_elements(self) -> std::result::Result<Elements, Self> {
        let elements: Elements = match self {
            Self::Array(items) => Box::new(items.into_iter().map(Ok)),
            Self::Set(set) => Box::new(set.into_iter().map(Ok)),
            Self::Map(map) => Box::new(
                map.into_iter()
                    .map(|(key, value)| Ok(Self::Array(vec![key, value]))),
            ),
            Self::Object(object) => Box::new(object.into_values().map(Ok)),
            Self::Str(text) => Box::new(characters(&text).into_iter().map(Ok)),
            Self::Bytes(bytes) => Box::new(bytes.into_iter().map(|byte| Ok(Self::from(byte)))),
            Self::Iter(iter) => Box::new(iter),
            other => return Err(other),
        };
        Ok(elements)
    }

    /// Writes the value as text, rendering `null` as nothing.
    pub(crate) fn write_text(&self, buffer: &mut String) {
        use std::fmt::Write;

        if !self.is_null() {
            let _ = write!(buffer, "{self}");
        }
    }
}

/// Splits text into one-character values.
pub(crate) fn characters(text: &str) -> Vec<Value> {
    text.chars().map(|character| Value::Str(character.to_string())).collect()
}

/// Joins values into text, rendering `null` as nothing.
pub(crate) fn join_text(values: &[Value]) -> String {
    let mut buffer = String::new();
    for value in values {
        value.write_text(&mut buffer);
    }
    buffer
}

// =============================================================================
// Equality and hashing
// =============================================================================

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn integral_float_equals(integer: i64, float: f64) -> bool {
    float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < i64::MAX as f64
        && float as i64 == integer
}

fn float_equals(left: f64, right: f64) -> bool {
    left == right || (left.is_nan() && right.is_nan())
}

fn normalized_bits(number: f64) -> u64 {
    if number.is_nan() {
        f64::NAN.to_bits()
    } else if number == 0.0 {
        0
    } else {
        number.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => float_equals(*left, *right),
            (Self::Int(integer), Self::Float(float)) | (Self::Float(float), Self::Int(integer)) => {
                integral_float_equals(*integer, *float)
            }
            (Self::Str(left), Self::Str(right)) => left == right,
            (Self::Bytes(left), Self::Bytes(right)) => left == right,
            (Self::Array(left), Self::Array(right)) => left == right,
            (Self::Set(left), Self::Set(right)) => left == right,
            (Self::Map(left), Self::Map(right)) => left == right,
            (Self::Object(left), Self::Object(right)) => left == right,
            (Self::Function(left), Self::Function(right)) => left.ptr_eq(right),
            (Self::Iter(left), Self::Iter(right)) => left.ptr_eq(right),
            (Self::Stream(left), Self::Stream(right)) => left.ptr_eq(right),
            (Self::Foreign(left), Self::Foreign(right)) => {
                std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    #[allow(clippy::cast_precision_loss)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0_u8.hash(state),
            Self::Bool(flag) => flag.hash(state),
            Self::Int(number) => normalized_bits(*number as f64).hash(state),
            Self::Float(number) => normalized_bits(*number).hash(state),
            Self::Str(text) => text.hash(state),
            Self::Bytes(bytes) => bytes.hash(state),
            Self::Array(items) => items.hash(state),
            // order-independent equality, so only the size participates
            Self::Set(set) => set.len().hash(state),
            Self::Map(map) => map.len().hash(state),
            Self::Object(object) => object.len().hash(state),
            Self::Function(function) => function.address().hash(state),
            Self::Iter(iter) => iter.address().hash(state),
            Self::Stream(stream) => stream.address().hash(state),
            Self::Foreign(foreign) => Rc::as_ptr(foreign).cast::<()>().hash(state),
        }
    }
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => formatter.write_str("null"),
            Self::Bool(flag) => write!(formatter, "{flag}"),
            Self::Int(number) => write!(formatter, "{number}"),
            Self::Float(number) if number.is_nan() => formatter.write_str("NaN"),
            Self::Float(number) if number.is_infinite() => {
                formatter.write_str(if *number > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Float(number) => write!(formatter, "{number}"),
            Self::Str(text) => formatter.write_str(text),
            Self::Bytes(bytes) => {
                for (position, byte) in bytes.iter().enumerate() {
                    if position > 0 {
                        formatter.write_str(",")?;
                    }
                    write!(formatter, "{byte}")?;
                }
                Ok(())
            }
            Self::Array(items) => {
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        formatter.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(formatter, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Set(_) => formatter.write_str("[object Set]"),
            Self::Map(_) => formatter.write_str("[object Map]"),
            Self::Object(_) => formatter.write_str("[object Object]"),
            Self::Function(_) => formatter.write_str("[function]"),
            Self::Iter(_) => formatter.write_str("[object Iterator]"),
            Self::Stream(_) => formatter.write_str("[object AsyncIterator]"),
            Self::Foreign(foreign) => write!(formatter, "[object {}]", foreign.type_name()),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

macro_rules! impl_from_integer {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Value {
                fn from(number: $integer) -> Self {
                    Self::Int(i64::from(number))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(number: usize) -> Self {
        i64::try_from(number).map_or(Self::Float(f64::INFINITY), Self::Int)
    }
}

impl From<f32> for Value {
    fn from(number: f32) -> Self {
        Self::Float(f64::from(number))
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Float(number)
    }
}

impl From<char> for Value {
    fn from(character: char) -> Self {
        Self::Str(character.to_string())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::array(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Self::Null, Into::into)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Self::Set(set)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Map(map)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<PullIter> for Value {
    fn from(iter: PullIter) -> Self {
        Self::Iter(iter)
    }
}

impl From<PullStream> for Value {
    fn from(stream: PullStream) -> Self {
        Self::Stream(stream)
    }
}
