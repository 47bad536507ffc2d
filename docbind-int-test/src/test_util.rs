use docbind::common::{Atomic, Convertible, ReadExecutor, Value, WriteExecutor, DOC_ID};
use docbind::document::{Document, ObjectId};
use docbind::errors::{DocBindError, DocBindResult, ErrorKind};
use docbind::mapper::Mapper;
use docbind::marshall::{restore_identity, Entity, Marshallable, Marshaller, TargetShape};
use docbind::query::Query;
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs a test between its set up and tear down steps.
/// `after` runs even when the test fails; panics are reported with a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocBindResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> DocBindResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DocBindResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let ctx = before().map_err(|e| format!("Before run failed: {:?}", e))?;
        let test_result = test(ctx.clone());
        let after_result = after(ctx);
        test_result.map_err(|e| format!("Test failed: {:?}", e))?;
        after_result.map_err(|e| format!("After run failed: {:?}", e))
    });

    let error = match result {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(panic_err) => {
            if let Some(s) = panic_err.downcast_ref::<&str>() {
                format!("Panic: {}", s)
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                format!("Panic: {}", s)
            } else {
                "Panic: unknown payload".to_string()
            }
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    let backtrace = Backtrace::capture().to_string();
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Error: {}", error);
}

#[derive(Clone)]
pub struct TestContext {
    mapper: Mapper,
    collection: FakeCollection,
}

impl TestContext {
    pub fn new(mapper: Mapper) -> Self {
        Self {
            mapper,
            collection: FakeCollection::new(),
        }
    }

    pub fn mapper(&self) -> Mapper {
        self.mapper.clone()
    }

    pub fn collection(&self) -> FakeCollection {
        self.collection.clone()
    }
}

pub fn create_test_context() -> DocBindResult<TestContext> {
    let mapper = Mapper::builder().build()?;
    Ok(TestContext::new(mapper))
}

pub fn create_test_context_with_token(token: &str) -> DocBindResult<TestContext> {
    let mapper = Mapper::builder().placeholder_token(token).build()?;
    Ok(TestContext::new(mapper))
}

pub fn cleanup(ctx: TestContext) -> DocBindResult<()> {
    ctx.collection().clear();
    Ok(())
}

/// In-memory stand-in for a store collection. Documents are kept in insertion
/// order; a lookup matches documents whose top-level fields equal every entry
/// of the parsed query.
#[derive(Clone, Default)]
pub struct FakeCollection {
    documents: Atomic<Vec<Document>>,
}

impl FakeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entity` the way a repository would, replacing a document with
    /// the same `_id`. Returns the stored id, if any.
    pub fn save<T: Entity>(&self, mapper: &Mapper, entity: &mut T) -> DocBindResult<Option<Value>> {
        let document = mapper.prepare_save(entity)?;
        let id = document.get_ref(DOC_ID).cloned();

        self.documents.write_with(|documents| {
            match id
                .as_ref()
                .and_then(|id| documents.iter().position(|doc| doc.get_ref(DOC_ID) == Some(id)))
            {
                Some(index) => documents[index] = document,
                None => documents.push(document),
            }
        });
        Ok(id)
    }

    pub fn find(&self, query: &Query) -> DocBindResult<Vec<Document>> {
        let filter = query.to_document()?;
        Ok(self.documents.read_with(|documents| {
            documents
                .iter()
                .filter(|doc| {
                    filter
                        .iter()
                        .all(|(key, expected)| doc.get(key).is_ok_and(|actual| &actual == expected))
                })
                .cloned()
                .collect()
        }))
    }

    pub fn find_by_id<T: Entity>(&self, mapper: &Mapper, id: Option<&ObjectId>) -> DocBindResult<Option<T>> {
        let query = mapper.id_query(id)?;
        match self.find(&query)?.first() {
            Some(document) => Ok(Some(mapper.unmarshall(document)?)),
            None => Ok(None),
        }
    }

    pub fn size(&self) -> usize {
        self.documents.read_with(|documents| documents.len())
    }

    pub fn clear(&self) {
        self.documents.write_with(|documents| documents.clear());
    }
}

/// Fails every marshalling call.
pub struct FailingMarshaller;

impl Marshaller for FailingMarshaller {
    fn marshall(&self, object: &dyn Marshallable) -> DocBindResult<Value> {
        Err(DocBindError::new(
            &format!("Cannot marshall {}", object.type_name()),
            ErrorKind::ObjectMappingError,
        ))
    }

    fn unmarshall(&self, fragment: &Value, shape: &TargetShape) -> DocBindResult<Value> {
        restore_identity(fragment, shape)
    }
}

/// Marshalls everything to the same fragment.
pub struct FixedMarshaller {
    fragment: Value,
}

impl FixedMarshaller {
    pub fn new(fragment: Value) -> Self {
        FixedMarshaller { fragment }
    }
}

impl Marshaller for FixedMarshaller {
    fn marshall(&self, _object: &dyn Marshallable) -> DocBindResult<Value> {
        Ok(self.fragment.clone())
    }

    fn unmarshall(&self, fragment: &Value, shape: &TargetShape) -> DocBindResult<Value> {
        restore_identity(fragment, shape)
    }
}

/// An object whose conversion always fails, like a self-referencing graph.
#[derive(Debug, Default)]
pub struct ErrorObject;

impl Convertible for ErrorObject {
    type Output = ErrorObject;

    fn to_value(&self) -> DocBindResult<Value> {
        Err(DocBindError::new(
            "ErrorObject cannot be converted",
            ErrorKind::ObjectMappingError,
        ))
    }

    fn from_value(_value: &Value) -> DocBindResult<Self::Output> {
        Ok(ErrorObject)
    }
}
