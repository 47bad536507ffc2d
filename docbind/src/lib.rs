#![allow(
    dead_code,
    unused_imports,
    clippy::approx_constant,
)]
//! # docbind - Document mapping and query binding
//!
//! docbind turns typed Rust values into query text and documents for a
//! document store that speaks a relaxed JSON dialect.
//!
//! ## Key Features
//!
//! - **Parameter binding**: positional `#` placeholders filled from typed parameters
//! - **Identities**: 12-byte [ObjectId](document::ObjectId)s, wrapped as `{$oid: "<hex>"}` in queries
//! - **Pluggable marshalling**: complex parameters and entities go through a [Marshaller](marshall::Marshaller)
//! - **Entities**: `#[derive(Convertible, Entity)]` from `docbind_derive` maps structs to documents
//! - **Query parsing**: bound text parses back into a [Document](document::Document)
//!
//! ## Quick Start
//!
//! ```rust
//! use docbind::mapper::Mapper;
//! use docbind::params;
//!
//! let mapper = Mapper::builder().build().unwrap();
//!
//! let query = mapper.create_query("{id:#, test:#}", &params![123, 456]).unwrap();
//! assert_eq!(query.as_str(), "{id:123, test:456}");
//!
//! let doc = query.to_document().unwrap();
//! assert_eq!(doc.size(), 2);
//! ```
//!
//! String parameters are written raw. Quote the placeholder in the template
//! when a string value is expected: `{name: '#'}`.
//!
//! ## Module Organization
//!
//! - [`common`] - Values, conversion traits and constants
//! - [`document`] - Documents, object ids and fragment text
//! - [`errors`] - Error types and result definitions
//! - [`marshall`] - Marshallers, entities and identity mapping
//! - [`query`] - Parameters, the binder and query parsing
//! - [`mapper`] - The mapper façade
//! - [`mapper_builder`] - Mapper builder
//! - [`mapper_config`] - Mapper configuration

use crate::document::ObjectIdGenerator;
use std::sync::LazyLock;

pub mod common;
pub mod document;
pub mod errors;
pub mod mapper;
pub mod mapper_builder;
pub mod mapper_config;
pub mod marshall;
pub mod query;

pub(crate) static ID_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(ObjectIdGenerator::new);

#[cfg(test)]
mod tests {
    use super::*;

    // Setup only one time throughout the crate's tests.
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn id_generator_produces_distinct_ids() {
        let first = ID_GENERATOR.next_bytes();
        let second = ID_GENERATOR.next_bytes();
        assert_ne!(first, second);
    }
}
