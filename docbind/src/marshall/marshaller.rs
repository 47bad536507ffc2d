use crate::common::{Convertible, Value};
use crate::errors::DocBindResult;
use crate::marshall::TargetShape;

/// An object that can be turned into a document-model fragment.
///
/// This is the object-safe half of [Convertible]: every `Convertible` type is
/// `Marshallable`, and a `&dyn Marshallable` is what the binder hands to a
/// [Marshaller] for complex parameters.
pub trait Marshallable {
    /// The value's own fragment, before any marshaller-specific handling.
    fn as_fragment(&self) -> DocBindResult<Value>;

    /// Name of the concrete type, for log and error messages.
    fn type_name(&self) -> &'static str;
}

impl<T> Marshallable for T
where
    T: Convertible,
{
    fn as_fragment(&self) -> DocBindResult<Value> {
        self.to_value()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Converts objects to document fragments and back.
///
/// A marshaller is injected into the binder and the mapper, so it must be
/// shareable across threads. Implementations must not return a default value
/// in place of a failed conversion.
///
/// ```rust,ignore
/// struct Upper;
///
/// impl Marshaller for Upper {
///     fn marshall(&self, object: &dyn Marshallable) -> DocBindResult<Value> {
///         object.as_fragment()
///     }
///
///     fn unmarshall(&self, fragment: &Value, shape: &TargetShape) -> DocBindResult<Value> {
///         restore_identity(fragment, shape)
///     }
/// }
/// ```
pub trait Marshaller: Send + Sync {
    /// Produces the fragment for `object`.
    fn marshall(&self, object: &dyn Marshallable) -> DocBindResult<Value>;

    /// Lays a stored fragment out for the type described by `shape`,
    /// mapping the stored identity onto the declared identity field.
    fn unmarshall(&self, fragment: &Value, shape: &TargetShape) -> DocBindResult<Value>;
}
