use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{Attribute, DataEnum, DataStruct, DeriveInput, Field, Fields, LitStr, Result, Type};

fn ignored_fields(attrs: &[Attribute]) -> Result<Vec<String>> {
    let mut ignored = vec![];
    for attr in attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    ignored.extend(
                        s.value()
                            .split(',')
                            .map(|field| field.trim().to_string())
                            .filter(|field| !field.is_empty()),
                    );
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute"))
                }
            })?;
        }
    }
    Ok(ignored)
}

// `value` must be in scope where the tokens are expanded
fn mapping_error(expected: &str) -> proc_macro2::TokenStream {
    quote! {
        docbind::common::mapping_error(value, #expected)
    }
}

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let ignored = ignored_fields(&ast.attrs)?;

    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let stored: Vec<&Ident> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref())
        .filter(|ident| !ignored.contains(&ident.to_string()))
        .collect();
    let stored_names: Vec<String> = stored.iter().map(|i| i.to_string()).collect();

    let initializers: Vec<proc_macro2::TokenStream> = fields
        .iter()
        .filter_map(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)))
        .map(|(ident, ty)| {
            let name = ident.to_string();
            if ignored.contains(&name) {
                quote! { #ident: Default::default() }
            } else {
                quote! { #ident: docbind::common::from_value::<#ty>(&doc.get(#name)?)? }
            }
        })
        .collect();

    let name = &ast.ident;
    let not_a_document = mapping_error(&format!("a {} document", name));
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = quote! {
        impl #impl_generics docbind::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docbind::errors::DocBindResult<docbind::common::Value> {
                let mut doc = docbind::document::Document::new();
                #(doc.insert(#stored_names, docbind::common::Convertible::to_value(&self.#stored)?);)*
                Ok(docbind::common::Value::Document(doc))
            }

            fn from_value(value: &docbind::common::Value) -> docbind::errors::DocBindResult<Self::Output> {
                match value {
                    docbind::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    _ => Err(#not_a_document),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let ignored = ignored_fields(&ast.attrs)?;

    let mut to_value_variants = Vec::with_capacity(data.variants.len());
    let mut from_value_variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();

        match &variant.fields {
            Fields::Named(fields) => {
                let all_idents: Vec<&Ident> = fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
                let stored: Vec<&Ident> = all_idents
                    .iter()
                    .copied()
                    .filter(|ident| !ignored.contains(&ident.to_string()))
                    .collect();
                let stored_names: Vec<String> = stored.iter().map(|i| i.to_string()).collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident { #(ref #all_idents),* } => {
                        let mut fields = docbind::document::Document::new();
                        #(fields.insert(#stored_names, docbind::common::Convertible::to_value(#stored)?);)*
                        let mut doc = docbind::document::Document::new();
                        doc.insert("variant", #variant_name);
                        doc.insert("value", docbind::common::Value::Document(fields));
                        Ok(docbind::common::Value::Document(doc))
                    }
                });

                let initializers: Vec<proc_macro2::TokenStream> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)))
                    .map(|(ident, ty)| {
                        let field_name = ident.to_string();
                        if ignored.contains(&field_name) {
                            quote! { #ident: Default::default() }
                        } else {
                            quote! { #ident: docbind::common::from_value::<#ty>(&fields.get(#field_name)?)? }
                        }
                    })
                    .collect();
                let not_a_document = mapping_error(&format!("a {}::{} document", name, variant_name));

                from_value_variants.push(quote! {
                    #variant_name => {
                        let value = &doc.get("value")?;
                        let fields = value.as_document().ok_or_else(|| #not_a_document)?;
                        Ok(#name::#variant_ident {
                            #(#initializers,)*
                        })
                    }
                });
            }
            Fields::Unnamed(fields) => {
                let field_count = fields.unnamed.len();
                let field_idents: Vec<Ident> = (0..field_count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident(#(#field_idents),*) => {
                        let mut array = Vec::with_capacity(#field_count);
                        #(array.push(docbind::common::Convertible::to_value(#field_idents)?);)*
                        let mut doc = docbind::document::Document::new();
                        doc.insert("variant", #variant_name);
                        doc.insert("value", docbind::common::Value::Array(array));
                        Ok(docbind::common::Value::Document(doc))
                    }
                });

                let field_indices: Vec<usize> = (0..field_count).collect();
                let field_types: Vec<&Type> = fields.unnamed.iter().map(|f| &f.ty).collect();
                let not_an_array = mapping_error(&format!(
                    "an array of {} items for {}::{}",
                    field_count, name, variant_name
                ));

                from_value_variants.push(quote! {
                    #variant_name => {
                        let value = &doc.get("value")?;
                        let items = value
                            .as_array()
                            .filter(|items| items.len() == #field_count)
                            .ok_or_else(|| #not_an_array)?;
                        Ok(#name::#variant_ident(
                            #(docbind::common::from_value::<#field_types>(&items[#field_indices])?,)*
                        ))
                    }
                });
            }
            Fields::Unit => {
                to_value_variants.push(quote! {
                    #name::#variant_ident => {
                        let mut doc = docbind::document::Document::new();
                        doc.insert("variant", #variant_name);
                        doc.insert("value", docbind::common::Value::Null);
                        Ok(docbind::common::Value::Document(doc))
                    }
                });

                from_value_variants.push(quote! {
                    #variant_name => Ok(#name::#variant_ident)
                });
            }
        }
    }

    let unknown_variant = mapping_error(&format!("a valid {} variant", name));
    let not_a_document = mapping_error(&format!("a {} document", name));

    let gen = quote! {
        impl #impl_generics docbind::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docbind::errors::DocBindResult<docbind::common::Value> {
                match self {
                    #(#to_value_variants),*
                }
            }

            fn from_value(value: &docbind::common::Value) -> docbind::errors::DocBindResult<Self::Output> {
                let docbind::common::Value::Document(doc) = value else {
                    return Err(#not_a_document);
                };

                match doc.get("variant")? {
                    docbind::common::Value::String(variant) => match variant.as_str() {
                        #(#from_value_variants,)*
                        _ => Err(#unknown_variant),
                    },
                    _ => Err(#unknown_variant),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
