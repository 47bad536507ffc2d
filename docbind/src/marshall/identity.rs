use crate::common::{Value, DOC_ID};
use crate::document::{Document, ObjectId};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use crate::marshall::{IdKind, TargetShape};

/// Maps a marshalled entity onto its stored layout: the declared identity
/// field becomes the leading `_id` entry.
///
/// Hex identities are stored as [ObjectId]s. A null identity is dropped so
/// the store can assign one. Shapes without an identity field are untouched.
pub fn store_identity(doc: &mut Document, shape: &TargetShape) -> DocBindResult<()> {
    let Some(entity_id) = shape.entity_id() else {
        return Ok(());
    };

    let field = entity_id.field_name();
    let value = match doc.remove(field)? {
        Some(value) if !value.is_null() => value,
        _ => {
            log::debug!("No identity set on {} field '{}'", shape.type_name(), field);
            return Ok(());
        }
    };

    let stored = match (entity_id.kind(), value) {
        (IdKind::Hex, Value::String(hex)) => Value::ObjectId(ObjectId::parse(&hex).map_err(|err| {
            log::error!("Identity '{}' of {} is not an object id", hex, shape.type_name());
            DocBindError::new_with_cause(
                &format!("Identity field '{}' of {} is not a valid object id", field, shape.type_name()),
                ErrorKind::InvalidId,
                err,
            )
        })?),
        (_, value) => value,
    };

    doc.insert(DOC_ID, stored);
    doc.move_to_front(DOC_ID);
    Ok(())
}

/// Lays a stored fragment out for `shape`: the `_id` entry is moved to the
/// declared identity field and coerced to its kind.
///
/// - `ObjectId` kind: a 24-hex string is parsed into an [ObjectId].
/// - `Hex` kind: an [ObjectId] becomes its hex string.
/// - `Custom` kind: the value passes through.
///
/// A missing `_id` yields a null field. Non-document fragments and shapes
/// without an identity field are returned unchanged.
pub fn restore_identity(fragment: &Value, shape: &TargetShape) -> DocBindResult<Value> {
    let (Value::Document(doc), Some(entity_id)) = (fragment, shape.entity_id()) else {
        return Ok(fragment.clone());
    };

    let mut doc = doc.clone();
    let field = entity_id.field_name();
    let stored = doc.get_ref(DOC_ID).cloned().unwrap_or(Value::Null);

    let restored = match (entity_id.kind(), stored) {
        (IdKind::ObjectId, Value::String(hex)) if ObjectId::is_valid(&hex) => {
            Value::ObjectId(ObjectId::parse(&hex)?)
        }
        (IdKind::Hex, Value::ObjectId(id)) => Value::String(id.to_hex()),
        (_, value) => value,
    };

    if doc.has_id() {
        doc.insert(DOC_ID, restored);
        doc.rename(DOC_ID, field);
    } else {
        doc.insert(field, restored);
    }
    Ok(Value::Document(doc))
}
