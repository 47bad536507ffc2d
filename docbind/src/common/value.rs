use crate::document::{fragment, Document, ObjectId};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    // NaN sorts after every other number and equals itself
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// A value held by a [Document], or a parameter handed to the binder.
///
/// Scalars map one to one onto the Rust primitives. `Document`, `Array`,
/// `Map` and `Bytes` are complex values; when bound into a query they are
/// serialized by the configured marshaller. `ObjectId` is the identity type.
///
/// Integers of different widths compare equal when they hold the same number,
/// so `Value::I32(5) == Value::I64(5)`. The same holds for `F32` and `F64`.
///
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let v3 = val!(true);
/// ```
#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    ISize(isize),
    USize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    /// A nested document.
    Document(Document),
    Array(Vec<Value>),
    /// A map with arbitrary keys. Rendered like a document with stringified keys.
    Map(BTreeMap<Value, Value>),
    /// The 12-byte identity value.
    ObjectId(ObjectId),
    /// Binary data, rendered as an array of numbers.
    Bytes(Vec<u8>),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", fragment::to_fragment(self))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.is_number() && other.is_number() {
            return match (self.as_integer(), other.as_integer()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => match (self, other) {
                    (Value::U128(a), Value::U128(b)) => a.cmp(b),
                    (Value::U128(_), o) if o.is_integer() => Ordering::Greater,
                    (o, Value::U128(_)) if o.is_integer() => Ordering::Less,
                    _ => num_cmp_float(self.to_f64_lossy(), other.to_f64_lossy()),
                },
            };
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::ObjectId(a), Value::ObjectId(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // numbers that compare equal must hash alike, whatever their width
        if let Some(v) = self.as_integer() {
            v.hash(state);
            return;
        }
        if let Some(v) = self.as_decimal() {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e38 {
                (v as i128).hash(state);
            } else {
                v.to_bits().hash(state);
            }
            return;
        }
        match self {
            Value::Null => "null_value".hash(state),
            Value::Bool(v) => v.hash(state),
            Value::U128(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Document(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
            Value::ObjectId(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            _ => {}
        }
    }
}

impl Value {
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a [Value] from an optional value; `None` becomes [Value::Null].
    pub fn from_option<T: Into<Value>>(value: Option<T>) -> Value {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }

    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    #[inline]
    pub fn as_bool(&self) -> Option<&bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<&i32> {
        match self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<&i64> {
        match self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<&f64> {
        match self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns any integer variant widened to `i128`.
    ///
    /// A `U128` above `i128::MAX` yields `None`.
    #[inline]
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(*v as i128),
            Value::U8(v) => Some(*v as i128),
            Value::I16(v) => Some(*v as i128),
            Value::U16(v) => Some(*v as i128),
            Value::I32(v) => Some(*v as i128),
            Value::U32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            Value::I128(v) => Some(*v),
            Value::U128(v) => i128::try_from(*v).ok(),
            Value::ISize(v) => Some(*v as i128),
            Value::USize(v) => Some(*v as i128),
            _ => None,
        }
    }

    #[inline]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_char(&self) -> Option<&char> {
        match self {
            Value::Char(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&Vec<u8>> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    pub fn is_object_id(&self) -> bool {
        matches!(self, Value::ObjectId(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::I8(_)
                | Value::U8(_)
                | Value::I16(_)
                | Value::U16(_)
                | Value::I32(_)
                | Value::U32(_)
                | Value::I64(_)
                | Value::U64(_)
                | Value::I128(_)
                | Value::U128(_)
                | Value::ISize(_)
                | Value::USize(_)
        )
    }

    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    /// Whether the binder writes this value as a literal rather than
    /// handing it to the marshaller.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Char(_) | Value::String(_) | Value::ObjectId(_)
        ) || self.is_number()
    }

    /// Takes the value, leaving [Value::Null] in its place.
    pub fn take(&mut self) -> Value {
        std::mem::replace(self, Value::Null)
    }

    /// Short lowercase name of the variant, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::I128(_) => "i128",
            Value::U128(_) => "u128",
            Value::ISize(_) => "isize",
            Value::USize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::ObjectId(_) => "object_id",
            Value::Bytes(_) => "bytes",
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Char(_) => 2,
            Value::String(_) => 3,
            Value::Document(_) => 4,
            Value::Map(_) => 5,
            Value::Array(_) => 6,
            Value::Bytes(_) => 7,
            Value::ObjectId(_) => 8,
            Value::Bool(_) => 9,
            _ => 1,
        }
    }

    fn to_f64_lossy(&self) -> f64 {
        match self {
            Value::F32(v) => *v as f64,
            Value::F64(v) => *v,
            Value::U128(v) => *v as f64,
            other => other.as_integer().map(|v| v as f64).unwrap_or(f64::NAN),
        }
    }

    pub(crate) fn to_debug_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Document(v) => format!("document({:?})", v),
            Value::Array(v) => format!(
                "array([{}])",
                v.iter().map(|it| it.to_debug_string()).collect::<Vec<_>>().join(", ")
            ),
            Value::Map(v) => format!(
                "map({{{}}})",
                v.iter()
                    .map(|(k, v)| format!("{}: {}", k.to_debug_string(), v.to_debug_string()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Bytes(v) => format!("bytes({:?})", v),
            Value::ObjectId(v) => format!("object_id(\"{}\")", v),
            Value::Char(v) => format!("char({:?})", v),
            Value::String(v) => format!("string({:?})", v),
            other => format!("{}({})", other.type_name(), fragment::to_fragment(other)),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(value: $t) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    i128 => I128,
    u128 => U128,
    isize => ISize,
    usize => USize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Document => Document,
    ObjectId => ObjectId,
    BTreeMap<Value, Value> => Map,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<&ObjectId> for Value {
    fn from(value: &ObjectId) -> Self {
        Value::ObjectId(*value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Value::from_option(value)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::from_vec(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// Creates a [Value] from an expression through its `From` conversion.
///
/// ```rust
/// use docbind::common::Value;
/// use docbind::val;
///
/// assert_eq!(val!(42), Value::I32(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
