use crate::common::Convertible;
use crate::document::ObjectId;

/// How an entity's identity field is typed, which decides how the stored
/// `_id` is converted on the way in and out.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum IdKind {
    /// The field holds an [ObjectId] (or `Option<ObjectId>`). Generated on save when unset.
    ObjectId,
    /// The field holds the hex form of an [ObjectId] as a `String`.
    /// Stored as an `ObjectId`, generated on save when unset.
    Hex,
    /// Any other type. Stored and loaded unchanged, never generated.
    Custom,
}

impl IdKind {
    /// Whether a missing identity of this kind is generated on save.
    pub fn is_generated(&self) -> bool {
        matches!(self, IdKind::ObjectId | IdKind::Hex)
    }
}

/// The identity field declared by an entity.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct EntityId {
    field_name: String,
    kind: IdKind,
}

impl EntityId {
    pub fn new(field_name: &str, kind: IdKind) -> Self {
        EntityId {
            field_name: field_name.to_string(),
            kind,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }
}

/// Layout information a marshaller needs to shape a fragment for a type.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct TargetShape {
    type_name: String,
    entity_id: Option<EntityId>,
}

impl TargetShape {
    /// A shape without an identity field.
    pub fn new(type_name: &str) -> Self {
        TargetShape {
            type_name: type_name.to_string(),
            entity_id: None,
        }
    }

    pub fn with_id(type_name: &str, field_name: &str, kind: IdKind) -> Self {
        TargetShape {
            type_name: type_name.to_string(),
            entity_id: Some(EntityId::new(field_name, kind)),
        }
    }

    pub fn of<T: Entity>() -> Self {
        T::target_shape()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn entity_id(&self) -> Option<&EntityId> {
        self.entity_id.as_ref()
    }
}

/// A type stored as a document, with at most one identity field.
///
/// Implemented by `#[derive(Entity)]`:
///
/// ```ignore
/// #[derive(Convertible, Entity, Default)]
/// #[entity(name = "friends", id(field = "key"))]
/// pub struct Friend {
///     key: Option<ObjectId>,
///     name: String,
/// }
/// ```
///
/// Only the declared identity field is mapped to `_id`. Other `ObjectId`
/// fields are plain values.
pub trait Entity: Convertible<Output = Self> {
    /// The entity name, the struct name unless overridden.
    fn entity_name() -> String;

    fn target_shape() -> TargetShape;

    /// The current identity, if it is set and readable as an [ObjectId].
    fn identity(&self) -> Option<ObjectId>;

    /// Writes a generated identity back into the identity field.
    fn set_identity(&mut self, id: ObjectId);

    /// Whether the identity field holds a caller-assigned value.
    fn identity_assigned(&self) -> bool {
        self.identity().is_some()
    }
}

/// Field types that can hold a generated identity.
///
/// Used by the `Entity` derive to read and write the identity field.
pub trait IdSlot {
    fn object_id(&self) -> Option<ObjectId>;
    fn assign(&mut self, id: ObjectId);
    fn is_assigned(&self) -> bool;
}

impl IdSlot for ObjectId {
    fn object_id(&self) -> Option<ObjectId> {
        Some(*self)
    }

    fn assign(&mut self, id: ObjectId) {
        *self = id;
    }

    fn is_assigned(&self) -> bool {
        true
    }
}

impl IdSlot for Option<ObjectId> {
    fn object_id(&self) -> Option<ObjectId> {
        *self
    }

    fn assign(&mut self, id: ObjectId) {
        *self = Some(id);
    }

    fn is_assigned(&self) -> bool {
        self.is_some()
    }
}

// hex identities; an empty string counts as unset
impl IdSlot for String {
    fn object_id(&self) -> Option<ObjectId> {
        ObjectId::parse(self).ok()
    }

    fn assign(&mut self, id: ObjectId) {
        *self = id.to_hex();
    }

    fn is_assigned(&self) -> bool {
        !self.is_empty()
    }
}

impl IdSlot for Option<String> {
    fn object_id(&self) -> Option<ObjectId> {
        self.as_deref().and_then(|hex| ObjectId::parse(hex).ok())
    }

    fn assign(&mut self, id: ObjectId) {
        *self = Some(id.to_hex());
    }

    fn is_assigned(&self) -> bool {
        self.as_deref().is_some_and(|hex| !hex.is_empty())
    }
}
