use crate::errors::{DocBindError, DocBindResult};
use crate::mapper::Mapper;
use crate::mapper_config::MapperConfig;
use crate::marshall::Marshaller;

/// Builder for a [Mapper].
///
/// The first invalid setting is kept and reported by [build](MapperBuilder::build);
/// later settings are ignored once an error is recorded.
///
/// ```rust
/// use docbind::mapper::Mapper;
/// use docbind::params;
///
/// let mapper = Mapper::builder()
///     .placeholder_token("@")
///     .build()
///     .unwrap();
///
/// let query = mapper.create_query("{age: {$gt: @}}", &params![18]).unwrap();
/// assert_eq!(query.as_str(), "{age: {$gt: 18}}");
/// ```
#[derive(Default)]
pub struct MapperBuilder {
    error: Option<DocBindError>,
    mapper_config: MapperConfig,
}

impl MapperBuilder {
    pub fn new() -> Self {
        MapperBuilder {
            error: None,
            mapper_config: MapperConfig::new(),
        }
    }

    /// Sets the placeholder token, `#` by default. It must be exactly one
    /// character, otherwise [build](MapperBuilder::build) fails with
    /// `InvalidArgument`.
    pub fn placeholder_token(mut self, token: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.mapper_config.set_placeholder_token(token) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Replaces the default [DocumentMarshaller](crate::marshall::DocumentMarshaller).
    pub fn marshaller<M: Marshaller + 'static>(mut self, marshaller: M) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.mapper_config.set_marshaller(marshaller) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> DocBindResult<Mapper> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.mapper_config.freeze();
        log::debug!("Mapper built with {:?}", self.mapper_config);
        Ok(Mapper::new(self.mapper_config))
    }
}
