use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use indexmap::IndexMap;
use strum::Display;

use crate::error::Error;
use crate::number::{format_number, parse_number};

/// Longest array a run may build.
pub const MAX_ARRAY_LENGTH: usize = 1 << 20;

pub type ArrayRef = Rc<RefCell<Elements>>;
pub type ObjectRef = Rc<RefCell<Properties>>;

/// Runtime value of a snippet.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Error(Rc<ErrorValue>),
    Native(Native),
}

/// Elements of an array.
///
/// Dropping releases nested arrays and objects iteratively, so arbitrarily
/// deep values cannot overflow the stack.
#[derive(Clone, Debug, Default)]
pub struct Elements(pub Vec<Value>);

/// Properties of an object in insertion order. Dropped like [`Elements`].
#[derive(Clone, Debug, Default)]
pub struct Properties(pub IndexMap<Rc<str>, Value>);

/// Object made by `Error` and its subclasses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub message: Rc<str>,
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
}

/// Built-in function, possibly bound to a receiver.
#[derive(Clone)]
pub enum Native {
    Math(MathFn),
    String,
    Number,
    Boolean,
    Error(ErrorKind),
    Array(ArrayRef, ArrayMethod),
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum MathFn {
    Floor,
    Ceil,
    Round,
    Trunc,
    Abs,
    Min,
    Max,
    Sqrt,
    Pow,
}

#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[strum(serialize_all = "camelCase")]
pub enum ArrayMethod {
    Push,
    Pop,
    Includes,
    IndexOf,
    Join,
}

impl Value {
    #[inline]
    pub fn string<S: Into<Rc<str>>>(s: S) -> Self {
        Value::String(s.into())
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(Elements(items))))
    }

    #[inline]
    pub fn object(props: IndexMap<Rc<str>, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(Properties(props))))
    }

    #[inline]
    pub fn error<S: Into<Rc<str>>>(kind: ErrorKind, message: S) -> Self {
        Value::Error(Rc::new(ErrorValue {
            kind,
            message: message.into(),
        }))
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Error(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Native(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Error(_) | Value::Native(_) => true,
        }
    }

    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    #[inline]
    fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Error(_) | Value::Native(_)
        )
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Native(_) | Value::Error(_) => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) => parse_number(&self.to_js_string()),
        }
    }

    /// Converts to a string as JavaScript's `String(value)` does.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_owned(),
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(arr) => join(arr, ","),
            Value::Object(_) => "[object Object]".to_owned(),
            Value::Error(err) => err.to_string(),
            Value::Native(native) => format!("function {native}() {{ [native code] }}"),
        }
    }

    /// Converts objects to primitives for operators. Primitives are returned
    /// unchanged.
    pub fn to_primitive(&self) -> Value {
        if self.is_object() {
            Value::string(self.to_js_string())
        } else {
            self.clone()
        }
    }

    /// `===`
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.same(b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(a), Value::String(_)) => *a == other.to_number(),
            (Value::String(_), Value::Number(b)) => self.to_number() == *b,
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_eq(other),
            (_, Value::Bool(_)) => self.loose_eq(&Value::Number(other.to_number())),
            (a, Value::Number(_) | Value::String(_)) if a.is_object() => {
                self.to_primitive().loose_eq(other)
            }
            (Value::Number(_) | Value::String(_), b) if b.is_object() => {
                self.loose_eq(&other.to_primitive())
            }
            _ => self.strict_eq(other),
        }
    }

    /// Equality used by `Array.prototype.includes`, where `NaN` equals itself.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_eq(other),
        }
    }
}

/// Joins the elements of `arr` as `Array.prototype.join` does. Nested arrays
/// are joined with `,` on an explicit stack, and an array met again while it
/// is being joined contributes the empty string.
pub(crate) fn join(arr: &ArrayRef, sep: &str) -> String {
    let mut out = String::new();
    // Arrays being joined, each with the index of its next element.
    let mut stack = vec![(arr.clone(), 0)];
    let mut visiting = HashSet::from([Rc::as_ptr(arr)]);
    loop {
        let depth = stack.len();
        let Some((arr, next)) = stack.last_mut() else {
            break;
        };
        let index = *next;
        *next += 1;
        let item = arr.borrow().get(index).cloned();
        let Some(item) = item else {
            if let Some((arr, _)) = stack.pop() {
                visiting.remove(&Rc::as_ptr(&arr));
            }
            continue;
        };
        if index != 0 {
            out.push_str(if depth == 1 { sep } else { "," });
        }
        match item {
            Value::Undefined | Value::Null => {}
            Value::Array(inner) => {
                if visiting.insert(Rc::as_ptr(&inner)) {
                    stack.push((inner, 0));
                }
            }
            item => out.push_str(&item.to_js_string()),
        }
    }
    out
}

/// Compares strings by UTF-16 code units, as JavaScript's relational
/// operators do.
pub(crate) fn compare_strings(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

impl Native {
    fn same(&self, other: &Native) -> bool {
        match (self, other) {
            (Native::Math(a), Native::Math(b)) => a == b,
            (Native::String, Native::String)
            | (Native::Number, Native::Number)
            | (Native::Boolean, Native::Boolean) => true,
            (Native::Error(a), Native::Error(b)) => a == b,
            (Native::Array(_, a), Native::Array(_, b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Native::Math(func) => write!(f, "{func}"),
            Native::String => write!(f, "String"),
            Native::Number => write!(f, "Number"),
            Native::Boolean => write!(f, "Boolean"),
            Native::Error(kind) => write!(f, "{kind}"),
            Native::Array(_, method) => write!(f, "{method}"),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl Elements {
    /// Truncates or pads with `undefined` to `len` elements. Storage is
    /// dense, so lengths past [`MAX_ARRAY_LENGTH`] are refused.
    pub fn set_length(&mut self, len: usize) -> Result<(), Error> {
        if len > MAX_ARRAY_LENGTH {
            return Err(Error::Range("Invalid array length".to_owned()));
        }
        self.0.resize(len, Value::Undefined);
        Ok(())
    }
}

impl Deref for Elements {
    type Target = Vec<Value>;

    #[inline]
    fn deref(&self) -> &Vec<Value> {
        &self.0
    }
}

impl DerefMut for Elements {
    #[inline]
    fn deref_mut(&mut self) -> &mut Vec<Value> {
        &mut self.0
    }
}

impl Deref for Properties {
    type Target = IndexMap<Rc<str>, Value>;

    #[inline]
    fn deref(&self) -> &IndexMap<Rc<str>, Value> {
        &self.0
    }
}

impl DerefMut for Properties {
    #[inline]
    fn deref_mut(&mut self) -> &mut IndexMap<Rc<str>, Value> {
        &mut self.0
    }
}

impl Drop for Elements {
    fn drop(&mut self) {
        release(mem::take(&mut self.0));
    }
}

impl Drop for Properties {
    fn drop(&mut self) {
        release(self.0.drain(..).map(|(_, value)| value).collect());
    }
}

/// Drops `pending` and everything only it keeps alive, one value at a time.
fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(arr) | Value::Native(Native::Array(arr, _)) => {
                if let Ok(cell) = Rc::try_unwrap(arr) {
                    pending.append(&mut cell.into_inner().0);
                }
            }
            Value::Object(obj) => {
                if let Ok(cell) = Rc::try_unwrap(obj) {
                    pending.extend(cell.into_inner().0.drain(..).map(|(_, value)| value));
                }
            }
            _ => {}
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(arr) => match arr.try_borrow() {
                Ok(items) => f.debug_list().entries(items.iter()).finish(),
                Err(_) => write!(f, "[..]"),
            },
            Value::Object(obj) => match obj.try_borrow() {
                Ok(props) => f.debug_map().entries(props.iter()).finish(),
                Err(_) => write!(f, "{{..}}"),
            },
            Value::Error(err) => write!(f, "[{err}]"),
            Value::Native(native) => write!(f, "[Function: {native}]"),
        }
    }
}

impl Debug for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {self}]")
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
