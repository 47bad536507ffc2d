mod document_marshaller;
mod entity;
mod identity;
mod marshaller;

pub use document_marshaller::*;
pub use entity::*;
pub use identity::*;
pub use marshaller::*;
