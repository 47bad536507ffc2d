use crate::common::Value;
use crate::errors::{DocBindError, DocBindResult};
use crate::marshall::{restore_identity, Marshallable, Marshaller, TargetShape};

/// The default [Marshaller], built on each type's [Convertible](crate::common::Convertible)
/// implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentMarshaller;

impl DocumentMarshaller {
    pub fn new() -> Self {
        DocumentMarshaller
    }
}

impl Marshaller for DocumentMarshaller {
    fn marshall(&self, object: &dyn Marshallable) -> DocBindResult<Value> {
        object.as_fragment().map_err(|err| {
            log::error!("Unable to marshall {}: {}", object.type_name(), err);
            DocBindError::new_with_cause(
                &format!("Unable to marshall object of type {}", object.type_name()),
                err.kind().clone(),
                err,
            )
        })
    }

    fn unmarshall(&self, fragment: &Value, shape: &TargetShape) -> DocBindResult<Value> {
        restore_identity(fragment, shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Convertible;
    use crate::doc;
    use crate::document::ObjectId;
    use crate::errors::ErrorKind;
    use crate::marshall::IdKind;

    struct Broken;

    impl Convertible for Broken {
        type Output = Broken;

        fn to_value(&self) -> DocBindResult<Value> {
            Err(DocBindError::new("cannot convert", ErrorKind::ObjectMappingError))
        }

        fn from_value(_value: &Value) -> DocBindResult<Self::Output> {
            Ok(Broken)
        }
    }

    #[test]
    fn marshalls_convertible_values() {
        let marshaller = DocumentMarshaller::new();
        let doc = doc! { custom: "object" };
        assert_eq!(marshaller.marshall(&doc).unwrap(), Value::Document(doc));
        assert_eq!(marshaller.marshall(&vec![1_i32]).unwrap(), Value::Array(vec![Value::I32(1)]));
    }

    #[test]
    fn keeps_cause_of_failed_marshalling() {
        let marshaller = DocumentMarshaller::new();
        let err = marshaller.marshall(&Broken).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
        assert!(err.message().contains("Broken"));
        assert_eq!(err.cause().map(|c| c.message()), Some("cannot convert"));
    }

    #[test]
    fn unmarshall_restores_identity() {
        let marshaller = DocumentMarshaller::new();
        let id = ObjectId::new();
        let stored = Value::Document(doc! { "_id": id, name: "John" });
        let shape = TargetShape::with_id("Friend", "id", IdKind::Hex);
        let value = marshaller.unmarshall(&stored, &shape).unwrap();
        assert_eq!(value, Value::Document(doc! { id: (id.to_hex()), name: "John" }));
    }

    #[test]
    fn is_object_safe() {
        let marshaller: Box<dyn Marshaller> = Box::new(DocumentMarshaller);
        assert!(marshaller.marshall(&5_i32).is_ok());
    }
}
