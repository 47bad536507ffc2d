use crate::common::{Value, DEFAULT_PLACEHOLDER, OID};
use crate::document::fragment;
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use crate::marshall::Marshaller;
use crate::query::{categorize, Parameter, ParameterKind};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Substitutes positional parameters into a query template.
///
/// Every occurrence of the placeholder token is a placeholder; there is no
/// escape sequence. Placeholders are filled left to right, one parameter
/// each, and the counts must match exactly.
///
/// Each parameter is written according to [categorize]:
///
/// | kind       | written as                                   |
/// |------------|----------------------------------------------|
/// | `Null`     | `null`                                       |
/// | `Literal`  | raw literal text                             |
/// | `Identity` | `{$oid: "<24 hex>"}`                         |
/// | `Complex`  | the marshaller's fragment, in fragment text form |
///
/// The binder holds no per-call state and can be shared between threads.
#[derive(Clone)]
pub struct ParameterBinder {
    marshaller: Arc<dyn Marshaller>,
    token: char,
}

impl ParameterBinder {
    pub fn new(marshaller: Arc<dyn Marshaller>) -> Self {
        ParameterBinder::with_token(marshaller, DEFAULT_PLACEHOLDER)
    }

    pub fn with_token(marshaller: Arc<dyn Marshaller>, token: char) -> Self {
        ParameterBinder { marshaller, token }
    }

    pub fn token(&self) -> char {
        self.token
    }

    pub fn marshaller(&self) -> &Arc<dyn Marshaller> {
        &self.marshaller
    }

    /// Binds `params` into `template`.
    ///
    /// Strings and chars are written raw, without quotes or escaping, so the
    /// template has to supply the quotes: `{name: "#"}` with `"John"` gives
    /// `{name: "John"}`, while `{name: #}` gives `{name: John}`. A string
    /// containing a quote or the placeholder token is not made safe.
    ///
    /// Floats keep a decimal point (`2.0`); non-finite floats are written as
    /// `NaN`, `Infinity` and `-Infinity`.
    ///
    /// # Errors
    ///
    /// - `InsufficientParameters` when the template has more placeholders than
    ///   `params`, naming the first unsatisfied placeholder.
    /// - `TooManyParameters` when `params` has more entries than placeholders.
    /// - `InvalidParameter` when the marshaller fails on a complex parameter,
    ///   with the marshaller error as cause.
    ///
    /// Counts are checked before any parameter is serialized, and nothing
    /// partially bound is ever returned.
    pub fn bind(&self, template: &str, params: &[Parameter<'_>]) -> DocBindResult<String> {
        let placeholders = template.chars().filter(|c| *c == self.token).count();

        if params.len() < placeholders {
            log::error!(
                "Query {} has {} placeholders but only {} parameters",
                template,
                placeholders,
                params.len()
            );
            return Err(DocBindError::new(
                &format!(
                    "Not enough parameters passed to query {}: {} placeholders, {} parameters",
                    template,
                    placeholders,
                    params.len()
                ),
                ErrorKind::InsufficientParameters {
                    placeholder: params.len(),
                    supplied: params.len(),
                },
            ));
        }

        if params.len() > placeholders {
            let surplus = params.len() - placeholders;
            log::error!(
                "Query {} has {} placeholders but {} parameters",
                template,
                placeholders,
                params.len()
            );
            return Err(DocBindError::new(
                &format!(
                    "Too many parameters passed to query {}: {} placeholders, {} surplus",
                    template, placeholders, surplus
                ),
                ErrorKind::TooManyParameters {
                    placeholders,
                    surplus,
                },
            ));
        }

        let mut bound = String::with_capacity(template.len() + params.len() * 8);
        let mut next = 0;
        for c in template.chars() {
            if c == self.token {
                self.write_parameter(next, &params[next], &mut bound)?;
                next += 1;
            } else {
                bound.push(c);
            }
        }

        log::trace!("Bound {} parameters into {}", params.len(), bound);
        Ok(bound)
    }

    fn write_parameter(&self, index: usize, param: &Parameter<'_>, out: &mut String) -> DocBindResult<()> {
        match (categorize(param), param) {
            (ParameterKind::Null, _) => out.push_str("null"),
            (ParameterKind::Literal, Parameter::Value(value)) => write_literal(index, value, out)?,
            (ParameterKind::Identity, Parameter::Value(Value::ObjectId(id))) => {
                out.push_str(&format!("{{{}: \"{}\"}}", OID, id.to_hex()));
            }
            (ParameterKind::Complex, _) => {
                let result = match param {
                    Parameter::Value(value) => self.marshaller.marshall(value),
                    Parameter::Object(object) => self.marshaller.marshall(*object),
                };

                match result {
                    Ok(fragment) => fragment::write_fragment(&fragment, out),
                    Err(err) => {
                        log::error!("Unable to bind parameter {} ({:?}): {}", index, param, err);
                        return Err(DocBindError::new_with_cause(
                            &format!("Unable to bind parameter {} ({:?})", index, param),
                            ErrorKind::InvalidParameter { index },
                            err,
                        ));
                    }
                }
            }
            (kind, _) => {
                log::error!("Parameter {} ({:?}) cannot be written as {:?}", index, param, kind);
                return Err(DocBindError::new(
                    &format!("Parameter {} ({:?}) cannot be written as {:?}", index, param, kind),
                    ErrorKind::InternalError,
                ));
            }
        }
        Ok(())
    }
}

fn write_literal(index: usize, value: &Value, out: &mut String) -> DocBindResult<()> {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Char(c) => out.push(*c),
        other => match fragment::scalar_literal(other) {
            Some(literal) => out.push_str(&literal),
            None => {
                log::error!("Parameter {} ({:?}) has no literal form", index, other);
                return Err(DocBindError::new(
                    &format!("Parameter {} ({:?}) has no literal form", index, other),
                    ErrorKind::InternalError,
                ));
            }
        },
    }
    Ok(())
}

impl Debug for ParameterBinder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterBinder")
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Convertible;
    use crate::doc;
    use crate::document::ObjectId;
    use crate::marshall::{DocumentMarshaller, Marshallable, TargetShape};
    use crate::params;

    struct FixedMarshaller(Value);

    impl Marshaller for FixedMarshaller {
        fn marshall(&self, _object: &dyn Marshallable) -> DocBindResult<Value> {
            Ok(self.0.clone())
        }

        fn unmarshall(&self, fragment: &Value, _shape: &TargetShape) -> DocBindResult<Value> {
            Ok(fragment.clone())
        }
    }

    struct FailingMarshaller;

    impl Marshaller for FailingMarshaller {
        fn marshall(&self, _object: &dyn Marshallable) -> DocBindResult<Value> {
            Err(DocBindError::new("marshalling failed", ErrorKind::ObjectMappingError))
        }

        fn unmarshall(&self, fragment: &Value, _shape: &TargetShape) -> DocBindResult<Value> {
            Ok(fragment.clone())
        }
    }

    struct Opaque;

    impl Convertible for Opaque {
        type Output = Opaque;

        fn to_value(&self) -> DocBindResult<Value> {
            Ok(Value::Document(doc! { opaque: true }))
        }

        fn from_value(_value: &Value) -> DocBindResult<Self::Output> {
            Ok(Opaque)
        }
    }

    fn binder() -> ParameterBinder {
        ParameterBinder::new(Arc::new(DocumentMarshaller))
    }

    #[test]
    fn binds_one_parameter() {
        assert_eq!(binder().bind("{id:#}", &params![123]).unwrap(), "{id:123}");
    }

    #[test]
    fn binds_many_parameters() {
        let bound = binder().bind("{id:#, test:#}", &params![123, 456]).unwrap();
        assert_eq!(bound, "{id:123, test:456}");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        assert_eq!(binder().bind("{a:1}", &params![]).unwrap(), "{a:1}");
        assert_eq!(binder().bind("", &params![]).unwrap(), "");
    }

    #[test]
    fn binds_null() {
        assert_eq!(binder().bind("{a:#}", &[Parameter::null()]).unwrap(), "{a:null}");
        assert_eq!(binder().bind("{a:#}", &params![None::<String>]).unwrap(), "{a:null}");
    }

    #[test]
    fn binds_literals_raw() {
        let bound = binder()
            .bind("{s:'#', c:#, b:#, f:#, g:#}", &params!["abc", 'x', true, 2.0, 1.5_f32])
            .unwrap();
        assert_eq!(bound, "{s:'abc', c:x, b:true, f:2.0, g:1.5}");
    }

    #[test]
    fn binds_non_finite_floats() {
        let bound = binder()
            .bind("[#, #, #]", &params![f64::NAN, f64::INFINITY, f64::NEG_INFINITY])
            .unwrap();
        assert_eq!(bound, "[NaN, Infinity, -Infinity]");
    }

    #[test]
    fn binds_object_id_with_wrapper() {
        let id = ObjectId::parse("47cc67093475061e3d95369d").unwrap();
        let bound = binder().bind("{_id:#}", &params![id]).unwrap();
        assert_eq!(bound, r#"{_id:{$oid: "47cc67093475061e3d95369d"}}"#);
    }

    #[test]
    fn binds_complex_values_through_marshaller() {
        let bound = binder().bind("{test:#}", &params![doc! { custom: "object" }]).unwrap();
        assert_eq!(bound, r#"{test:{ "custom" : "object"}}"#);

        let bound = binder().bind("{tags:{$in:#}}", &params![vec!["a", "b"]]).unwrap();
        assert_eq!(bound, r#"{tags:{$in:[ "a" , "b"]}}"#);

        let bound = binder().bind("{o:#}", &[Parameter::object(&Opaque)]).unwrap();
        assert_eq!(bound, r#"{o:{ "opaque" : true}}"#);
    }

    #[test]
    fn uses_injected_marshaller() {
        let binder = ParameterBinder::new(Arc::new(FixedMarshaller(Value::Document(doc! { custom: "object" }))));
        let bound = binder.bind("{test:#}", &[Parameter::object(&Opaque)]).unwrap();
        assert_eq!(bound, r#"{test:{ "custom" : "object"}}"#);
    }

    #[test]
    fn marshaller_failure_is_invalid_parameter() {
        let binder = ParameterBinder::new(Arc::new(FailingMarshaller));
        let err = binder
            .bind("{a:#, b:#}", &[Parameter::from(1), Parameter::object(&Opaque)])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidParameter { index: 1 });
        assert_eq!(err.cause().map(|c| c.message()), Some("marshalling failed"));
    }

    #[test]
    fn literals_skip_marshaller() {
        let binder = ParameterBinder::new(Arc::new(FailingMarshaller));
        assert_eq!(binder.bind("{a:#}", &params![1]).unwrap(), "{a:1}");
    }

    #[test]
    fn too_few_parameters() {
        let err = binder().bind("{id:#,id2:#}", &params!["123"]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InsufficientParameters { placeholder: 1, supplied: 1 }
        );
    }

    #[test]
    fn too_many_parameters() {
        let err = binder().bind("{id:#}", &params![123, 456]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::TooManyParameters { placeholders: 1, surplus: 1 }
        );
    }

    #[test]
    fn count_errors_win_over_marshaller_errors() {
        let binder = ParameterBinder::new(Arc::new(FailingMarshaller));
        let err = binder
            .bind("{a:#}", &[Parameter::object(&Opaque), Parameter::from(1)])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TooManyParameters { placeholders: 1, surplus: 1 });
    }

    #[test]
    fn custom_token() {
        let binder = ParameterBinder::with_token(Arc::new(DocumentMarshaller), '@');
        assert_eq!(binder.token(), '@');
        assert_eq!(binder.bind("{id:@}", &params![123]).unwrap(), "{id:123}");
        assert_eq!(binder.bind("{id:#}", &params![]).unwrap(), "{id:#}");
    }

    #[test]
    fn tokens_inside_strings_are_placeholders() {
        let bound = binder().bind("{tag:'#'}", &params!["x"]).unwrap();
        assert_eq!(bound, "{tag:'x'}");
    }

    #[test]
    fn multibyte_template_and_token() {
        let binder = ParameterBinder::with_token(Arc::new(DocumentMarshaller), '§');
        let bound = binder.bind("{név:§, ключ:§}", &params![1, "二"]).unwrap();
        assert_eq!(bound, "{név:1, ключ:二}");
    }

    #[test]
    fn literal_without_text_form_is_an_error() {
        let mut out = String::new();
        let err = write_literal(2, &Value::Array(vec![]), &mut out).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        assert!(out.is_empty());
    }

    #[test]
    fn every_parameter_writes_text() {
        let binder = binder();
        let id = ObjectId::new();
        let params = params![
            Value::Null,
            true,
            7_u8,
            -3_i64,
            1e-7_f64,
            'c',
            "s",
            id,
            Value::Array(vec![Value::from(1)]),
        ];
        for (index, param) in params.iter().enumerate() {
            let mut out = String::new();
            binder.write_parameter(index, param, &mut out).unwrap();
            assert!(!out.is_empty(), "parameter {} wrote nothing", index);
        }
    }

    #[test]
    fn binder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParameterBinder>();
    }
}
