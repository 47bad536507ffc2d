#![allow(non_snake_case)]

use crate::common::{atomic, Atomic, ReadExecutor, Value};
use crate::document::{Document, ObjectId};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;

/// Conversion between a Rust type and its document-model [Value].
///
/// `to_value` produces the fragment a marshaller writes; `from_value` rebuilds
/// the type from a stored value. Implementations exist for the primitives,
/// strings, [ObjectId], [Document], collections and tuples. Structs and enums
/// get one through `#[derive(Convertible)]`.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> DocBindResult<Value>;
    fn from_value(value: &Value) -> DocBindResult<Self::Output>;
}

/// Logs and builds the `ObjectMappingError` for a value of the wrong shape.
/// `expected` reads as "Value is not {expected}", e.g. `"a document"`.
pub fn mapping_error(value: &Value, expected: &str) -> DocBindError {
    log::error!("Value {} is not {}", value, expected);
    DocBindError::new(
        &format!("Value is not {}", expected),
        ErrorKind::ObjectMappingError,
    )
}

// Integers are read back from any integer variant as long as the number fits,
// since a stored document may widen or narrow them (the query parser yields
// i32 or i64 only).
macro_rules! impl_convertible_for_integers {
    ($($t:ty => $variant:ident, $article:literal),* $(,)?) => {
        $(
            impl Convertible for $t {
                type Output = $t;

                fn to_value(&self) -> DocBindResult<Value> {
                    Ok(Value::$variant(*self))
                }

                #[allow(unreachable_patterns)]
                fn from_value(value: &Value) -> DocBindResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(*v),
                        Value::U128(v) => <$t>::try_from(*v)
                            .map_err(|_| mapping_error(value, concat!($article, " ", stringify!($t)))),
                        _ => match value.as_integer() {
                            Some(v) => <$t>::try_from(v)
                                .map_err(|_| mapping_error(value, concat!($article, " ", stringify!($t)))),
                            None => Err(mapping_error(value, concat!($article, " ", stringify!($t)))),
                        },
                    }
                }
            }
        )*
    };
}

impl_convertible_for_integers! {
    i8 => I8, "an",
    i16 => I16, "an",
    i32 => I32, "an",
    i64 => I64, "an",
    i128 => I128, "an",
    isize => ISize, "an",
    u8 => U8, "a",
    u16 => U16, "a",
    u32 => U32, "a",
    u64 => U64, "a",
    u128 => U128, "a",
    usize => USize, "a",
}

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::F32(*self))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::F32(v) => Ok(*v),
            Value::F64(v) => Ok(*v as f32),
            _ => Err(mapping_error(value, "an f32")),
        }
    }
}

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::F64(v) => Ok(*v),
            Value::F32(v) => Ok(*v as f64),
            // whole numbers come back from the query parser as integers
            _ => match value.as_integer() {
                Some(v) => Ok(v as f64),
                None => Err(mapping_error(value, "an f64")),
            },
        }
    }
}

impl Convertible for char {
    type Output = char;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::Char(*self))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::Char(c) => Ok(*c),
            Value::String(s) if s.chars().count() == 1 => {
                s.chars().next().ok_or_else(|| mapping_error(value, "a char"))
            }
            _ => Err(mapping_error(value, "a char")),
        }
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mapping_error(value, "a string")),
        }
    }
}

impl Convertible for &str {
    type Output = String;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        String::from_value(value)
    }
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mapping_error(value, "a bool")),
        }
    }
}

impl Convertible for () {
    type Output = ();

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::Null => Ok(()),
            _ => Err(mapping_error(value, "null")),
        }
    }
}

impl Convertible for ObjectId {
    type Output = ObjectId;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::ObjectId(*self))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::ObjectId(id) => Ok(*id),
            _ => Err(mapping_error(value, "an object id")),
        }
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

impl Convertible for BTreeMap<Value, Value> {
    type Output = BTreeMap<Value, Value>;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(Value::Map(self.clone()))
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        match value {
            Value::Map(map) => Ok(map.clone()),
            _ => Err(mapping_error(value, "a map")),
        }
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> DocBindResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> DocBindResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    type Output = Box<T::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Atomic<T>
where
    T: Convertible,
{
    type Output = Atomic<T::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        self.read_with(|it| it.to_value())
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        Ok(atomic(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible + Any,
{
    type Output = Vec<T::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            let mut bytes = Vec::with_capacity(self.len());
            for item in self {
                match item.to_value()? {
                    Value::U8(b) => bytes.push(b),
                    other => return Err(mapping_error(&other, "a u8")),
                }
            }
            return Ok(Value::Bytes(bytes));
        }

        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        match value {
            Value::Bytes(bytes) => bytes.iter().map(|b| T::from_value(&Value::U8(*b))).collect(),
            Value::Array(arr) => arr.iter().map(T::from_value).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

fn document_from_entries<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> DocBindResult<Value>
where
    K: ToString + 'a,
    V: Convertible + 'a,
{
    let mut doc = Document::new();
    for (k, v) in entries {
        doc.insert(k.to_string(), v.to_value()?);
    }
    Ok(Value::Document(doc))
}

fn parse_key<K: FromStr>(key: &str) -> DocBindResult<K> {
    K::from_str(key).map_err(|_| {
        log::error!("Failed to convert key {} to the map key type", key);
        DocBindError::new(
            &format!("Failed to convert key {} to the map key type", key),
            ErrorKind::ObjectMappingError,
        )
    })
}

impl<K, V> Convertible for BTreeMap<K, V>
where
    K: ToString + FromStr + Ord,
    V: Convertible,
{
    type Output = BTreeMap<K, V::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        document_from_entries(self.iter())
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        match value {
            Value::Document(doc) => {
                let mut result = BTreeMap::new();
                for (k, v) in doc.iter() {
                    result.insert(parse_key::<K>(k)?, V::from_value(v)?);
                }
                Ok(result)
            }
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

impl<K, V> Convertible for HashMap<K, V>
where
    K: ToString + FromStr + Eq + Hash,
    V: Convertible,
{
    type Output = HashMap<K, V::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        // sort the entries so equal maps produce equal documents
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.to_string(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        document_from_entries(entries.iter().map(|(k, v)| (k, *v)))
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        match value {
            Value::Document(doc) => {
                let mut result = HashMap::new();
                for (k, v) in doc.iter() {
                    result.insert(parse_key::<K>(k)?, V::from_value(v)?);
                }
                Ok(result)
            }
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

impl<V> Convertible for HashSet<V>
where
    V: Convertible,
    V::Output: Eq + Hash,
{
    type Output = HashSet<V::Output>;

    fn to_value(&self) -> DocBindResult<Value> {
        let mut array = Vec::with_capacity(self.len());
        for item in self {
            array.push(item.to_value()?);
        }
        Ok(Value::Array(array))
    }

    fn from_value(value: &Value) -> DocBindResult<Self::Output> {
        match value {
            Value::Array(arr) => arr.iter().map(V::from_value).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

macro_rules! impl_convertible_for_tuples {
    ($(($($T:ident),+)),+) => {
        $(
            impl<$($T),+> Convertible for ($($T),+) where $($T: Convertible),+ {
                type Output = ($($T::Output),+);

                fn to_value(&self) -> DocBindResult<Value> {
                    let ($($T),+) = self;
                    Ok(Value::Array(vec![$($T.to_value()?),+]))
                }

                fn from_value(value: &Value) -> DocBindResult<Self::Output> {
                    match value {
                        Value::Array(arr) => {
                            if arr.len() != count_idents!($($T),+) {
                                return Err(mapping_error(value, "a tuple"));
                            }
                            let mut iter = arr.iter();
                            Ok(($($T::from_value(iter.next().ok_or_else(|| DocBindError::new(
                                "Tuple element missing",
                                ErrorKind::ObjectMappingError,
                            ))?)?),+))
                        }
                        _ => Err(mapping_error(value, "an array")),
                    }
                }
            }
        )+
    };
}

macro_rules! count_idents {
    ($($idents:ident),*) => {
        <[()]>::len(&[$(count_idents!(@sub $idents)),*])
    };
    (@sub $idents:ident) => { () };
}

impl_convertible_for_tuples! {
    (T1, T2),
    (T1, T2, T3),
    (T1, T2, T3, T4),
    (T1, T2, T3, T4, T5),
    (T1, T2, T3, T4, T5, T6),
    (T1, T2, T3, T4, T5, T6, T7),
    (T1, T2, T3, T4, T5, T6, T7, T8),
    (T1, T2, T3, T4, T5, T6, T7, T8, T9),
    (T1, T2, T3, T4, T5, T6, T7, T8, T9, T10),
    (T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11),
    (T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12)
}

pub fn from_value<T>(value: &Value) -> DocBindResult<T::Output>
where
    T: Convertible,
{
    T::from_value(value)
}

pub fn to_value<T>(data: &T) -> DocBindResult<Value>
where
    T: Convertible,
{
    data.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn test_convertible<T>(value: T, expected: Value)
    where
        T: Convertible<Output = T> + PartialEq + std::fmt::Debug,
    {
        let to_value = value.to_value().unwrap();
        assert_eq!(to_value, expected);

        let from_value = T::from_value(&expected).unwrap();
        assert_eq!(from_value, value);
    }

    fn test_convertible_error<T>(value: &Value, expected_error: &str)
    where
        T: Convertible,
        T::Output: std::fmt::Debug,
    {
        let error = T::from_value(value).unwrap_err();
        assert_eq!(error.to_string(), expected_error);
        assert_eq!(error.kind(), &ErrorKind::ObjectMappingError);
    }

    #[test]
    fn test_integers() {
        test_convertible(42_i8, Value::I8(42));
        test_convertible(42_u16, Value::U16(42));
        test_convertible(-7_i64, Value::I64(-7));
        test_convertible(7_usize, Value::USize(7));
        test_convertible_error::<i32>(&Value::from("42"), "Value is not an i32");
    }

    #[test]
    fn test_integers_read_across_widths() {
        assert_eq!(i64::from_value(&Value::I32(5)).unwrap(), 5);
        assert_eq!(u8::from_value(&Value::I64(200)).unwrap(), 200);
        test_convertible_error::<u8>(&Value::I32(300), "Value is not a u8");
        test_convertible_error::<u32>(&Value::I32(-1), "Value is not a u32");
    }

    #[test]
    fn test_floats() {
        test_convertible(1.5_f64, Value::F64(1.5));
        test_convertible(1.5_f32, Value::F32(1.5));
        assert_eq!(f64::from_value(&Value::I32(2)).unwrap(), 2.0);
        test_convertible_error::<f32>(&Value::Bool(true), "Value is not an f32");
    }

    #[test]
    fn test_char_and_string() {
        test_convertible('c', Value::Char('c'));
        assert_eq!(char::from_value(&Value::from("c")).unwrap(), 'c');
        test_convertible_error::<char>(&Value::from("cc"), "Value is not a char");
        test_convertible("text".to_string(), Value::from("text"));
        assert_eq!(<&str>::from_value(&Value::from("x")).unwrap(), "x".to_string());
    }

    #[test]
    fn test_bool_and_unit() {
        test_convertible(true, Value::Bool(true));
        test_convertible((), Value::Null);
        test_convertible_error::<bool>(&Value::Null, "Value is not a bool");
    }

    #[test]
    fn test_object_id() {
        let id = ObjectId::new();
        test_convertible(id, Value::ObjectId(id));
        test_convertible_error::<ObjectId>(&Value::from(id.to_hex()), "Value is not an object id");
    }

    #[test]
    fn test_document() {
        let doc = doc! { a: 1 };
        test_convertible(doc.clone(), Value::Document(doc));
    }

    #[test]
    fn test_option() {
        test_convertible(Some(3_i32), Value::I32(3));
        test_convertible(None::<i32>, Value::Null);
    }

    #[test]
    fn test_box_and_atomic() {
        test_convertible(Box::new(3_i32), Value::I32(3));
        let value = atomic(3_i32).to_value().unwrap();
        assert_eq!(value, Value::I32(3));
        let back = Atomic::<i32>::from_value(&value).unwrap();
        assert_eq!(*back.read(), 3);
    }

    #[test]
    fn test_vec() {
        test_convertible(vec![1_i32, 2], Value::Array(vec![Value::I32(1), Value::I32(2)]));
        test_convertible(vec![1_u8, 2], Value::Bytes(vec![1, 2]));
        test_convertible_error::<Vec<i32>>(&Value::I32(1), "Value is not an array");
    }

    #[test]
    fn test_maps() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2_i32);
        map.insert("a".to_string(), 1_i32);
        test_convertible(map, Value::Document(doc! { a: 1, b: 2 }));

        let mut map = HashMap::new();
        map.insert(1_i32, "one".to_string());
        let value = map.to_value().unwrap();
        assert_eq!(value, Value::Document(doc! { "1": "one" }));
        assert_eq!(HashMap::<i32, String>::from_value(&value).unwrap(), map);

        let bad = Value::Document(doc! { x: "one" });
        assert!(HashMap::<i32, String>::from_value(&bad).is_err());
    }

    #[test]
    fn test_hash_set() {
        let set: HashSet<i32> = [1].into_iter().collect();
        test_convertible(set, Value::Array(vec![Value::I32(1)]));
    }

    #[test]
    fn test_tuples() {
        test_convertible((1_i32, "a".to_string()), Value::Array(vec![Value::I32(1), Value::from("a")]));
        test_convertible_error::<(i32, i32)>(&Value::Array(vec![Value::I32(1)]), "Value is not a tuple");
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(to_value(&5_i32).unwrap(), Value::I32(5));
        assert_eq!(from_value::<i32>(&Value::I32(5)).unwrap(), 5);
    }
}
