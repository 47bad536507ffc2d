mod document;
pub mod fragment;
mod object_id;
mod object_id_generator;

pub use document::*;
pub use object_id::*;
pub(crate) use object_id_generator::ObjectIdGenerator;
