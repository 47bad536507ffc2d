use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::{DataStruct, DeriveInput, Fields, LitStr, Result};

enum IdKind {
    ObjectId,
    Hex,
    Custom,
}

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    if !matches!(data.fields, Fields::Named(_)) {
        return Err(syn::Error::new_spanned(ast, "Only structs with named fields are supported"));
    }

    let mut entity_name = name.to_string();
    let mut id_field: Option<String> = None;
    let mut hex = false;
    let mut id_found = false;

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else if meta.path.is_ident("id") {
                    if id_found {
                        return Err(meta.error("Multiple id attributes are not allowed"));
                    }
                    id_found = true;

                    meta.parse_nested_meta(|meta| {
                        if meta.path.is_ident("field") {
                            let value = meta.value()?;
                            let s: LitStr = value.parse()?;
                            id_field = Some(s.value());
                            Ok(())
                        } else if meta.path.is_ident("hex") {
                            hex = true;
                            Ok(())
                        } else {
                            Err(meta.error("Unknown id attribute"))
                        }
                    })
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?
        }
    }

    if id_found && id_field.is_none() {
        return Err(syn::Error::new_spanned(ast, "The id attribute needs a field name"));
    }

    let type_name = name.to_string();
    let entity_name_code = quote! {
        fn entity_name() -> String {
            #entity_name.to_string()
        }
    };

    let Some(id_field_name) = id_field else {
        return Ok(TokenStream::from(quote! {
            impl #impl_generics docbind::marshall::Entity for #name #ty_generics #where_clause {
                #entity_name_code

                fn target_shape() -> docbind::marshall::TargetShape {
                    docbind::marshall::TargetShape::new(#type_name)
                }

                fn identity(&self) -> Option<docbind::document::ObjectId> {
                    None
                }

                fn set_identity(&mut self, _id: docbind::document::ObjectId) {}
            }
        }));
    };

    let Some(field) = data.fields.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == &id_field_name)
    }) else {
        return Err(syn::Error::new_spanned(
            ast,
            format!("Field {} not found in struct", id_field_name),
        ));
    };

    let field_type = field.ty.to_token_stream().to_string();
    let kind = if hex {
        if !field_type.contains("String") {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!("Hex id field {} must be a String or Option<String>", id_field_name),
            ));
        }
        IdKind::Hex
    } else if field_type.contains("ObjectId") {
        IdKind::ObjectId
    } else {
        IdKind::Custom
    };

    let ident = &field.ident;
    let (kind_code, accessors) = match kind {
        IdKind::Custom => (
            quote! { docbind::marshall::IdKind::Custom },
            quote! {
                fn identity(&self) -> Option<docbind::document::ObjectId> {
                    None
                }

                fn set_identity(&mut self, _id: docbind::document::ObjectId) {}

                fn identity_assigned(&self) -> bool {
                    true
                }
            },
        ),
        IdKind::ObjectId | IdKind::Hex => {
            let kind_code = if matches!(kind, IdKind::Hex) {
                quote! { docbind::marshall::IdKind::Hex }
            } else {
                quote! { docbind::marshall::IdKind::ObjectId }
            };
            (
                kind_code,
                quote! {
                    fn identity(&self) -> Option<docbind::document::ObjectId> {
                        docbind::marshall::IdSlot::object_id(&self.#ident)
                    }

                    fn set_identity(&mut self, id: docbind::document::ObjectId) {
                        docbind::marshall::IdSlot::assign(&mut self.#ident, id)
                    }

                    fn identity_assigned(&self) -> bool {
                        docbind::marshall::IdSlot::is_assigned(&self.#ident)
                    }
                },
            )
        }
    };

    let gen = quote! {
        impl #impl_generics docbind::marshall::Entity for #name #ty_generics #where_clause {
            #entity_name_code

            fn target_shape() -> docbind::marshall::TargetShape {
                docbind::marshall::TargetShape::with_id(#type_name, #id_field_name, #kind_code)
            }

            #accessors
        }
    };

    Ok(TokenStream::from(gen))
}
