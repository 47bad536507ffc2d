use crate::common::{Value, DOC_ID};
use crate::document::{Document, ObjectId};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use crate::mapper_builder::MapperBuilder;
use crate::mapper_config::MapperConfig;
use crate::marshall::{store_identity, Entity, TargetShape};
use crate::query::{Parameter, ParameterBinder, Query};
use std::sync::Arc;

/// Entry point for binding queries and mapping entities to documents.
///
/// A `Mapper` is a cheap handle: clones share the same configuration and
/// binder, and it can be used from any number of threads.
///
/// ```rust
/// use docbind::document::ObjectId;
/// use docbind::mapper::Mapper;
/// use docbind::params;
///
/// let mapper = Mapper::builder().build().unwrap();
///
/// let query = mapper.create_query("{name: '#', age: #}", &params!["John", 30]).unwrap();
/// assert_eq!(query.as_str(), "{name: 'John', age: 30}");
///
/// let id = ObjectId::parse("47cc67093475061e3d95369d").unwrap();
/// let query = mapper.id_query(Some(&id)).unwrap();
/// assert_eq!(query.as_str(), "{_id:{$oid: \"47cc67093475061e3d95369d\"}}");
/// ```
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl Mapper {
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub(crate) fn new(config: MapperConfig) -> Self {
        Mapper {
            inner: Arc::new(MapperInner::new(config)),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.inner.binder
    }

    /// Binds `params` into `template`. See [ParameterBinder::bind].
    pub fn create_query(&self, template: &str, params: &[Parameter<'_>]) -> DocBindResult<Query> {
        self.inner.create_query(template, params)
    }

    /// The query matching one document by identity.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `id` is `None`.
    pub fn id_query(&self, id: Option<&ObjectId>) -> DocBindResult<Query> {
        self.inner.id_query(id)
    }

    /// Prepares `entity` for storage and returns the document to store.
    ///
    /// When the identity field is an unset `ObjectId` or hex string, a fresh
    /// [ObjectId] is generated and written back to the entity. The entity is
    /// only modified when the whole operation succeeds.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the entity cannot be marshalled or its identity
    /// cannot be stored, with the underlying error as cause.
    pub fn prepare_save<T: Entity>(&self, entity: &mut T) -> DocBindResult<Document> {
        self.inner.prepare_save(entity)
    }

    /// Maps a stored document back to an entity.
    pub fn unmarshall<T: Entity>(&self, document: &Document) -> DocBindResult<T> {
        self.inner.unmarshall(document)
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.inner.config)
            .finish()
    }
}

struct MapperInner {
    config: MapperConfig,
    binder: ParameterBinder,
}

impl MapperInner {
    fn new(config: MapperConfig) -> Self {
        let binder = ParameterBinder::with_token(config.marshaller(), config.placeholder_token());
        MapperInner { config, binder }
    }

    fn create_query(&self, template: &str, params: &[Parameter<'_>]) -> DocBindResult<Query> {
        let bound = self.binder.bind(template, params)?;
        Ok(Query::new(template, bound))
    }

    fn id_query(&self, id: Option<&ObjectId>) -> DocBindResult<Query> {
        let Some(id) = id else {
            log::error!("Cannot look up a document by a null id");
            return Err(DocBindError::new("Object id cannot be null", ErrorKind::InvalidArgument));
        };

        let template = format!("{{{}:{}}}", DOC_ID, self.binder.token());
        self.create_query(&template, &[Parameter::from(id)])
    }

    fn prepare_save<T: Entity>(&self, entity: &mut T) -> DocBindResult<Document> {
        let shape = T::target_shape();
        self.to_stored_document(entity, &shape).map(|(document, generated)| {
            if let Some(id) = generated {
                log::debug!("Generated id {} for {}", id, shape.type_name());
                entity.set_identity(id);
            }
            document
        }).map_err(|err| {
            log::error!("Unable to save object of type {}: {}", shape.type_name(), err);
            DocBindError::new_with_cause(
                &format!("Unable to save object of type {}", shape.type_name()),
                ErrorKind::InvalidArgument,
                err,
            )
        })
    }

    fn to_stored_document<T: Entity>(
        &self,
        entity: &T,
        shape: &TargetShape,
    ) -> DocBindResult<(Document, Option<ObjectId>)> {
        let generated = shape
            .entity_id()
            .filter(|entity_id| entity_id.kind().is_generated() && !entity.identity_assigned())
            .map(|_| ObjectId::new());

        let mut document = match self.config.marshaller().marshall(entity)? {
            Value::Document(document) => document,
            other => {
                log::error!("{} marshalled to {} instead of a document", shape.type_name(), other.type_name());
                return Err(DocBindError::new(
                    &format!("{} did not marshall to a document", shape.type_name()),
                    ErrorKind::ObjectMappingError,
                ));
            }
        };

        if let (Some(id), Some(entity_id)) = (generated, shape.entity_id()) {
            document.insert(entity_id.field_name(), id);
        }
        store_identity(&mut document, shape)?;
        Ok((document, generated))
    }

    fn unmarshall<T: Entity>(&self, document: &Document) -> DocBindResult<T> {
        let shape = T::target_shape();
        let fragment = self
            .config
            .marshaller()
            .unmarshall(&Value::Document(document.clone()), &shape)?;
        T::from_value(&fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Convertible;
    use crate::marshall::IdKind;
    use crate::params;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Friend {
        key: Option<ObjectId>,
        name: String,
    }

    impl Convertible for Friend {
        type Output = Friend;

        fn to_value(&self) -> DocBindResult<Value> {
            let mut doc = Document::new();
            doc.insert("key", Value::from(self.key));
            doc.insert("name", self.name.as_str());
            Ok(Value::Document(doc))
        }

        fn from_value(value: &Value) -> DocBindResult<Self::Output> {
            let doc = value.as_document().ok_or_else(|| {
                DocBindError::new("Friend must be a document", ErrorKind::ObjectMappingError)
            })?;
            Ok(Friend {
                key: Option::<ObjectId>::from_value(&doc.get("key")?)?,
                name: String::from_value(&doc.get("name")?)?,
            })
        }
    }

    impl Entity for Friend {
        fn entity_name() -> String {
            "Friend".to_string()
        }

        fn target_shape() -> TargetShape {
            TargetShape::with_id("Friend", "key", IdKind::ObjectId)
        }

        fn identity(&self) -> Option<ObjectId> {
            self.key
        }

        fn set_identity(&mut self, id: ObjectId) {
            self.key = Some(id);
        }
    }

    #[derive(Default)]
    struct Unsavable {
        id: Option<ObjectId>,
    }

    impl Convertible for Unsavable {
        type Output = Unsavable;

        fn to_value(&self) -> DocBindResult<Value> {
            Err(DocBindError::new("cycle detected", ErrorKind::ObjectMappingError))
        }

        fn from_value(_value: &Value) -> DocBindResult<Self::Output> {
            Ok(Unsavable::default())
        }
    }

    impl Entity for Unsavable {
        fn entity_name() -> String {
            "Unsavable".to_string()
        }

        fn target_shape() -> TargetShape {
            TargetShape::with_id("Unsavable", "id", IdKind::ObjectId)
        }

        fn identity(&self) -> Option<ObjectId> {
            self.id
        }

        fn set_identity(&mut self, id: ObjectId) {
            self.id = Some(id);
        }
    }

    fn mapper() -> Mapper {
        Mapper::builder().build().unwrap()
    }

    #[test]
    fn creates_queries() {
        let query = mapper().create_query("{id:#, test:#}", &params![123, 456]).unwrap();
        assert_eq!(query.as_str(), "{id:123, test:456}");
        assert_eq!(query.template(), "{id:#, test:#}");
    }

    #[test]
    fn id_query_wraps_object_id() {
        let id = ObjectId::new();
        let query = mapper().id_query(Some(&id)).unwrap();
        assert_eq!(query.as_str(), format!("{{_id:{{$oid: \"{}\"}}}}", id.to_hex()));
        assert_eq!(query.to_document().unwrap().get("_id").unwrap(), Value::ObjectId(id));
    }

    #[test]
    fn id_query_uses_configured_token() {
        let mapper = Mapper::builder().placeholder_token("@").build().unwrap();
        let id = ObjectId::new();
        assert!(mapper.id_query(Some(&id)).unwrap().as_str().contains(&id.to_hex()));
    }

    #[test]
    fn id_query_rejects_null() {
        let err = mapper().id_query(None).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn save_generates_and_writes_back_id() {
        let mut friend = Friend {
            key: None,
            name: "John".to_string(),
        };
        let doc = mapper().prepare_save(&mut friend).unwrap();
        let id = friend.key.expect("id written back");
        assert_eq!(doc, crate::doc! { "_id": id, name: "John" });
    }

    #[test]
    fn save_keeps_assigned_id() {
        let id = ObjectId::new();
        let mut friend = Friend {
            key: Some(id),
            name: "John".to_string(),
        };
        let doc = mapper().prepare_save(&mut friend).unwrap();
        assert_eq!(friend.key, Some(id));
        assert_eq!(doc.object_id(), Some(id));
    }

    #[test]
    fn failed_save_is_invalid_argument_and_leaves_entity() {
        let mut unsavable = Unsavable::default();
        let err = mapper().prepare_save(&mut unsavable).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert!(err.message().starts_with("Unable to save object"));
        assert!(err.cause().is_some());
        assert!(unsavable.id.is_none());
    }

    #[test]
    fn unmarshall_round_trips_saved_entity() {
        let mapper = mapper();
        let mut friend = Friend {
            key: None,
            name: "Jane".to_string(),
        };
        let doc = mapper.prepare_save(&mut friend).unwrap();
        let restored: Friend = mapper.unmarshall(&doc).unwrap();
        assert_eq!(restored, friend);
    }

    #[test]
    fn clones_share_state() {
        let mapper = mapper();
        let other = mapper.clone();
        assert!(Arc::ptr_eq(&mapper.inner, &other.inner));
    }

    #[test]
    fn mapper_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Mapper>();
    }
}
