#![recursion_limit = "128"]
//! # docbind Derive Macros
//!
//! Procedural macros for deriving docbind traits.
//!
//! ## Macros
//!
//! ### `Convertible`
//!
//! Derives `docbind::common::Convertible` for structs with named fields and
//! for enums, mapping them to and from `Value::Document`.
//!
//! - **Struct attribute**: `#[converter(ignored = "a, b")]` skips fields; they
//!   are restored with `Default::default()`.
//!
//! ```rust,ignore
//! use docbind_derive::Convertible;
//!
//! #[derive(Convertible)]
//! pub struct User {
//!     pub name: String,
//!     pub age: u32,
//! }
//!
//! #[derive(Convertible)]
//! pub enum Status {
//!     Active,
//!     Suspended { reason: String },
//! }
//! ```
//!
//! ### `Entity`
//!
//! Derives `docbind::marshall::Entity` for structs with named fields. At most
//! one identity field can be declared.
//!
//! - `#[entity(name = "...")]` overrides the entity name.
//! - `#[entity(id(field = "..."))]` declares the identity field. An
//!   `Option<ObjectId>` field that is `None` gets a generated id on save. A
//!   plain `ObjectId` field always holds a value and is saved as is.
//! - `#[entity(id(field = "...", hex))]` declares a `String` or
//!   `Option<String>` field holding a hex object id. An empty string or
//!   `None` gets a generated id on save.
//! - Any other field type is a custom identity, never generated.
//!
//! ```rust,ignore
//! use docbind::document::ObjectId;
//! use docbind_derive::{Convertible, Entity};
//!
//! #[derive(Convertible, Entity, Default)]
//! #[entity(name = "friends", id(field = "key"))]
//! pub struct Friend {
//!     pub key: Option<ObjectId>,
//!     pub name: String,
//! }
//! ```

extern crate proc_macro;
mod convertible;
mod entity;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Convertible` trait.
///
/// # Attributes
///
/// - `#[converter(ignored = "field1, field2")]` - fields left out of the document
///
/// # Errors
///
/// Returns a compile error for unions and for tuple or unit structs.
#[proc_macro_derive(Convertible, attributes(converter))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions. Unions are not supported by the Convertible derive macro.",
        )),
    };

    match result {
        Ok(token_stream) => token_stream,
        Err(e) => {
            let error = syn::Error::new_spanned(
                &ast,
                format!(
                    "Failed to derive Convertible for '{}': {}.\n\
                     Make sure all fields implement Convertible trait.",
                    ast.ident, e
                ),
            );
            error.to_compile_error().into()
        }
    }
}

/// Derives the `Entity` trait. Must be used with `#[derive(Convertible)]`.
///
/// # Attributes
///
/// - `#[entity(name = "...")]` - entity name, the struct name by default
/// - `#[entity(id(field = "..."))]` - identity field
/// - `#[entity(id(field = "...", hex))]` - identity field holding a hex object id
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum or union
/// - More than one `id` is declared
/// - The declared id field does not exist
/// - `hex` is used on a field that is not a `String`
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new_spanned(
                    &ast,
                    format!("Failed to derive Entity for struct '{}': {}", ast.ident, e),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for enums. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
    }
}
