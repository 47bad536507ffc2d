use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::document::{fragment, ObjectId};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

/// A document: string keys mapped to [Value]s, kept in insertion order.
///
/// Field order is significant. Two documents are equal only when they hold
/// the same entries in the same order, matching how the backing store
/// compares documents.
///
/// Keys containing the field separator (`.`) address embedded documents when
/// passed to [Document::put], [Document::get] and [Document::remove].
/// [Document::insert] always stores the key as is, which query documents
/// need for dotted filter keys such as `"address.city"`.
///
/// ```rust,ignore
/// let mut doc = Document::new();
/// doc.put("user.name", "Alice")?;
/// assert_eq!(doc.get("user.name")?, Value::from("Alice"));
/// ```
#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating embedded documents along a
    /// dotted path. Replacing an existing key keeps its position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the key, or any segment of a dotted key,
    /// is empty.
    pub fn put<K: AsRef<str>, T: Into<Value>>(&mut self, key: K, value: T) -> DocBindResult<()> {
        let key = key.as_ref();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocBindError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value.into())
        } else {
            self.data.insert(key.to_string(), value.into());
            Ok(())
        }
    }

    /// Stores `value` under `key` exactly as given, without path expansion.
    pub fn insert<K: Into<String>, T: Into<Value>>(&mut self, key: K, value: T) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Returns the value for `key`, or [Value::Null] when there is none.
    ///
    /// An exact top-level match wins over a dotted path lookup. Numeric path
    /// segments index into arrays.
    pub fn get(&self, key: &str) -> DocBindResult<Value> {
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None if key.contains(FIELD_SEPARATOR) => {
                let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
                self.recursive_get(self.data.get(splits[0]), &splits[1..])
            }
            None => Ok(Value::Null),
        }
    }

    /// Borrows a top-level entry.
    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove(&mut self, key: &str) -> DocBindResult<Option<Value>> {
        if self.data.contains_key(key) || !key.contains(FIELD_SEPARATOR) {
            return Ok(self.data.shift_remove(key));
        }

        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// The identity entry, if it holds an [ObjectId].
    pub fn object_id(&self) -> Option<ObjectId> {
        match self.data.get(DOC_ID) {
            Some(Value::ObjectId(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Moves `key` to the front of the document.
    pub fn move_to_front(&mut self, key: &str) {
        if let Some(index) = self.data.get_index_of(key) {
            self.data.move_index(index, 0);
        }
    }

    /// Renames a top-level key in place, keeping its position.
    ///
    /// Returns `false` when `from` does not exist. An existing `to` entry
    /// is replaced.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.data.contains_key(from);
        }
        let Some(index) = self.data.get_index_of(from) else {
            return false;
        };
        let Some((_, value)) = self.data.shift_remove_index(index) else {
            return false;
        };
        self.data.shift_remove(to);
        let index = index.min(self.data.len());
        self.data.shift_insert(index, to.to_string(), value);
        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.data.iter()
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> DocBindResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocBindError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_put(&splits[1..], value),
            _ => {
                // anything that is not a document at this level is replaced
                let mut nested = Document::new();
                nested.deep_put(&splits[1..], value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> DocBindResult<Option<Value>> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocBindError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        if splits.len() == 1 {
            return Ok(self.data.shift_remove(key));
        }

        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_remove(&splits[1..]),
            _ => Ok(None),
        }
    }

    fn recursive_get(&self, value: Option<&Value>, splits: &[&str]) -> DocBindResult<Value> {
        let value = match value {
            None => return Ok(Value::Null),
            Some(v) => v,
        };

        let Some((key, rest)) = splits.split_first() else {
            return Ok(value.clone());
        };

        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocBindError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        match value {
            Value::Document(doc) => self.recursive_get(doc.data.get(*key), rest),
            Value::Array(arr) => match key.parse::<usize>() {
                Ok(index) if index < arr.len() => self.recursive_get(Some(&arr[index]), rest),
                Ok(index) => {
                    log::error!("Array index {} out of bound", index);
                    Err(DocBindError::new(
                        &format!("Array index {} out of bound", index),
                        ErrorKind::InvalidOperation,
                    ))
                }
                Err(_) => Ok(Value::Null),
            },
            _ => Ok(Value::Null),
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len() && self.data.iter().eq(other.data.iter())
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.len().hash(state);
        for (k, v) in self.data.iter() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", fragment::document_fragment(self))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax. Keys are stored as written,
/// without dotted path expansion.
///
/// ```rust
/// use docbind::doc;
///
/// let empty = doc!{};
///
/// let base = 100;
/// let complex = doc!{
///     name: "Charlie",
///     score: (base * 2),
///     address: {
///         city: "Paris",
///         tags: ["home", "billing"]
///     }
/// };
/// assert_eq!(complex.size(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::document::Document::new()
    };

    () => {
        $crate::document::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.insert($crate::document::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Converts one value position of the [doc!] macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn set_up() -> Document {
        doc! {
            name: "Alice",
            age: 30,
            address: {
                city: "Paris",
                zip: 75001
            },
            tags: ["a", "b"]
        }
    }

    #[test]
    fn test_new_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let mut doc = Document::new();
        doc.put("name", "Bob").unwrap();
        assert_eq!(doc.get("name").unwrap(), Value::from("Bob"));
        assert_eq!(doc.get("missing").unwrap(), Value::Null);
    }

    #[test]
    fn test_put_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        let err = doc.put("a..b", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_deep_put() {
        let mut doc = Document::new();
        doc.put("user.name", "Alice").unwrap();
        doc.put("user.email", "alice@example.com").unwrap();
        assert_eq!(doc.size(), 1);
        assert_eq!(doc.get("user.name").unwrap(), Value::from("Alice"));
        assert_eq!(doc.get("user").unwrap().as_document().map(|d| d.size()), Some(2));
    }

    #[test]
    fn test_deep_get() {
        let doc = set_up();
        assert_eq!(doc.get("address.city").unwrap(), Value::from("Paris"));
        assert_eq!(doc.get("tags.1").unwrap(), Value::from("b"));
        assert_eq!(doc.get("address.country").unwrap(), Value::Null);
        assert_eq!(doc.get("name.first").unwrap(), Value::Null);
        assert!(doc.get("tags.5").is_err());
    }

    #[test]
    fn test_exact_dotted_key_wins() {
        let mut doc = Document::new();
        doc.insert("address.city", "Lyon");
        doc.put("address.city", "Paris").unwrap();
        assert_eq!(doc.get("address.city").unwrap(), Value::from("Lyon"));
        assert_eq!(doc.size(), 2);
    }

    #[test]
    fn test_remove() {
        let mut doc = set_up();
        assert_eq!(doc.remove("age").unwrap(), Some(Value::I32(30)));
        assert_eq!(doc.remove("address.zip").unwrap(), Some(Value::I32(75001)));
        assert_eq!(doc.get("address").unwrap(), Value::Document(doc! { city: "Paris" }));
        assert_eq!(doc.remove("missing").unwrap(), None);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let doc = doc! { z: 1, a: 2, m: 3 };
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        assert_eq!(doc! { a: 1, b: 2 }, doc! { a: 1, b: 2 });
        assert_ne!(doc! { a: 1, b: 2 }, doc! { b: 2, a: 1 });
    }

    #[test]
    fn test_object_id() {
        let id = ObjectId::new();
        let doc = doc! { "_id": id };
        assert_eq!(doc.object_id(), Some(id));
        assert!(doc.has_id());
        assert_eq!(doc! { "_id": 5 }.object_id(), None);
    }

    #[test]
    fn test_move_to_front() {
        let mut doc = doc! { a: 1, b: 2, "_id": 3 };
        doc.move_to_front("_id");
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["_id", "a", "b"]);
    }

    #[test]
    fn test_rename() {
        let mut doc = doc! { "_id": 1, name: "x" };
        assert!(doc.rename("_id", "key"));
        assert_eq!(doc, doc! { key: 1, name: "x" });
        assert!(!doc.rename("missing", "other"));
    }

    #[test]
    fn test_display() {
        let doc = doc! { name: "Alice", nested: { n: 1 } };
        assert_eq!(doc.to_string(), r#"{ "name" : "Alice" , "nested" : { "n" : 1}}"#);
        assert_eq!(Document::new().to_string(), "{ }");
    }

    #[test]
    fn test_iter() {
        let doc = set_up();
        assert_eq!(doc.iter().count(), 4);
        let collected: Document = doc.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(collected, doc);
    }

    #[test]
    fn test_macro_with_expressions() {
        let base = 10;
        let doc = doc! { value: (base * 2), list: [1, (base)] };
        assert_eq!(doc.get("value").unwrap(), Value::I32(20));
        assert_eq!(doc.get("list").unwrap(), Value::Array(vec![Value::I32(1), Value::I32(10)]));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"quoted\""), "quoted");
        assert_eq!(normalize("plain"), "plain");
    }
}
