use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_PLACEHOLDER};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use crate::marshall::{DocumentMarshaller, Marshaller};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration shared by a [Mapper](crate::mapper::Mapper) and its clones.
///
/// Holds the placeholder token and the marshaller. Settings can only change
/// through [MapperBuilder](crate::mapper_builder::MapperBuilder); once the
/// mapper is built they are frozen.
#[derive(Clone)]
pub struct MapperConfig {
    inner: Arc<MapperConfigInner>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig::new()
    }
}

impl MapperConfig {
    /// A configuration with the `#` token and the [DocumentMarshaller].
    pub fn new() -> Self {
        MapperConfig {
            inner: Arc::new(MapperConfigInner::new()),
        }
    }

    pub fn placeholder_token(&self) -> char {
        self.inner.placeholder_token()
    }

    /// Sets the placeholder token. It must be exactly one character.
    pub fn set_placeholder_token(&self, token: &str) -> DocBindResult<()> {
        self.inner.set_placeholder_token(token)
    }

    pub fn marshaller(&self) -> Arc<dyn Marshaller> {
        self.inner.marshaller()
    }

    pub fn set_marshaller<M: Marshaller + 'static>(&self, marshaller: M) -> DocBindResult<()> {
        self.inner.set_marshaller(Arc::new(marshaller))
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    pub(crate) fn freeze(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

impl Debug for MapperConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperConfig")
            .field("placeholder_token", &self.placeholder_token())
            .field("configured", &self.is_configured())
            .finish()
    }
}

struct MapperConfigInner {
    configured: AtomicBool,
    placeholder_token: Atomic<char>,
    marshaller: Atomic<Arc<dyn Marshaller>>,
}

impl MapperConfigInner {
    fn new() -> Self {
        MapperConfigInner {
            configured: AtomicBool::new(false),
            placeholder_token: atomic(DEFAULT_PLACEHOLDER),
            marshaller: atomic(Arc::new(DocumentMarshaller)),
        }
    }

    fn placeholder_token(&self) -> char {
        self.placeholder_token.read_with(|it| *it)
    }

    fn set_placeholder_token(&self, token: &str) -> DocBindResult<()> {
        self.ensure_not_configured("Placeholder token")?;

        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                self.placeholder_token.write_with(|it| *it = c);
                Ok(())
            }
            _ => {
                log::error!("Invalid placeholder token '{}'", token);
                Err(DocBindError::new(
                    &format!("Placeholder token must be a single character, got '{}'", token),
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }

    fn marshaller(&self) -> Arc<dyn Marshaller> {
        self.marshaller.read_with(|it| it.clone())
    }

    fn set_marshaller(&self, marshaller: Arc<dyn Marshaller>) -> DocBindResult<()> {
        self.ensure_not_configured("Marshaller")?;
        self.marshaller.write_with(|it| *it = marshaller);
        Ok(())
    }

    fn ensure_not_configured(&self, setting: &str) -> DocBindResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after the mapper is built", setting);
            return Err(DocBindError::new(
                &format!("{} cannot be changed after the mapper is built", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
