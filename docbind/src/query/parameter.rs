use crate::common::Value;
use crate::document::{Document, ObjectId};
use crate::marshall::Marshallable;
use std::fmt::{Debug, Formatter};

/// One positional query parameter.
///
/// Plain values convert with `From`/`into()`; any other object is passed by
/// reference with [Parameter::object] and serialized by the marshaller.
///
/// ```rust,ignore
/// let friend = Friend::new("John");
/// let params = params![123, "abc", Parameter::object(&friend)];
/// ```
pub enum Parameter<'a> {
    Value(Value),
    Object(&'a dyn Marshallable),
}

impl<'a> Parameter<'a> {
    pub fn object<M: Marshallable>(object: &'a M) -> Self {
        Parameter::Object(object)
    }

    pub fn null() -> Self {
        Parameter::Value(Value::Null)
    }
}

/// How the binder serializes a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Written as `null`.
    Null,
    /// Booleans, numbers, chars and strings, written as raw literal text.
    Literal,
    /// An [ObjectId], written as `{$oid: "<hex>"}`.
    Identity,
    /// Everything else, serialized by the marshaller.
    Complex,
}

/// Decides how a parameter is serialized. The first matching rule wins:
/// null, literal, identity, then complex.
pub fn categorize(parameter: &Parameter<'_>) -> ParameterKind {
    match parameter {
        Parameter::Value(Value::Null) => ParameterKind::Null,
        Parameter::Value(Value::ObjectId(_)) => ParameterKind::Identity,
        Parameter::Value(value) if value.is_scalar() => ParameterKind::Literal,
        Parameter::Value(_) => ParameterKind::Complex,
        Parameter::Object(_) => ParameterKind::Complex,
    }
}

impl Debug for Parameter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameter::Value(value) => write!(f, "Value({:?})", value),
            Parameter::Object(object) => write!(f, "Object({})", object.type_name()),
        }
    }
}

macro_rules! impl_from_for_parameter {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Parameter<'_> {
                fn from(value: $t) -> Self {
                    Parameter::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_from_for_parameter! {
    bool, i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize, f32, f64, char,
    String, &str, &String, ObjectId, &ObjectId, Document, (),
}

impl From<Value> for Parameter<'_> {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

impl<T> From<Option<T>> for Parameter<'_>
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Parameter::Value(Value::from_option(value))
    }
}

impl<T> From<Vec<T>> for Parameter<'_>
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Parameter::Value(Value::from_vec(value))
    }
}

/// Builds a `Vec<Parameter>` from values and [Parameter]s.
///
/// ```rust
/// use docbind::params;
///
/// let params = params![123, "abc", 1.5];
/// assert_eq!(params.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::query::Parameter>::new()
    };
    ($($param:expr),+ $(,)?) => {
        vec![$($crate::query::Parameter::from($param)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn null_parameters() {
        assert_eq!(categorize(&Parameter::null()), ParameterKind::Null);
        assert_eq!(categorize(&Parameter::from(None::<i32>)), ParameterKind::Null);
        assert_eq!(categorize(&Parameter::from(())), ParameterKind::Null);
    }

    #[test]
    fn literal_parameters() {
        for param in params![true, 1_i8, 2_u64, 1.5_f32, 'c', "text", String::from("s"), Some(3)] {
            assert_eq!(categorize(&param), ParameterKind::Literal, "{:?}", param);
        }
    }

    #[test]
    fn identity_parameters() {
        let id = ObjectId::new();
        assert_eq!(categorize(&Parameter::from(id)), ParameterKind::Identity);
        assert_eq!(categorize(&Parameter::from(&id)), ParameterKind::Identity);
        assert_eq!(categorize(&Parameter::from(Value::ObjectId(id))), ParameterKind::Identity);
    }

    #[test]
    fn complex_parameters() {
        let doc = doc! { a: 1 };
        assert_eq!(categorize(&Parameter::from(doc.clone())), ParameterKind::Complex);
        assert_eq!(categorize(&Parameter::from(vec![1, 2])), ParameterKind::Complex);
        assert_eq!(categorize(&Parameter::from(Value::Bytes(vec![1]))), ParameterKind::Complex);
        assert_eq!(categorize(&Parameter::object(&doc)), ParameterKind::Complex);
        assert_eq!(categorize(&Parameter::object(&5_i32)), ParameterKind::Complex);
    }

    #[test]
    fn debug_names_objects_by_type() {
        let param = Parameter::object(&5_i32);
        assert_eq!(format!("{:?}", param), "Object(i32)");
        assert_eq!(format!("{:?}", Parameter::from(5)), "Value(i32(5))");
    }

    #[test]
    fn empty_params_macro() {
        let params = params![];
        assert!(params.is_empty());
    }
}
