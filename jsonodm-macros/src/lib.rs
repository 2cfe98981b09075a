//! Procedural macros for the jsonodm project.
//!
//! This crate provides `#[derive(Record)]`, which implements
//! `jsonodm::document::Record` for a struct with a named identifier field.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Record)]
//! #[record(collection = "users")]
//! pub struct User {
//!     #[record(id)]
//!     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
//!     pub id: Option<ObjectId>,
//!     pub name: Option<String>,
//! }
//! ```
//!
//! `#[record(collection)]` with no value declares the collection by the type's own
//! name. Leaving the attribute off entirely compiles, but every mapper operation on
//! the type then fails with a configuration error.

#[allow(unused_extern_crates)]
extern crate self as jsonodm_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let collection = match collection_attr(input)? {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    };
    let id = id_field(input)?;

    Ok(quote! {
        impl #impl_generics ::jsonodm::document::Record for #name #ty_generics #where_clause {
            fn id(&self) -> ::core::option::Option<&::jsonodm::id::ObjectId> {
                self.#id.as_ref()
            }

            fn set_id(&mut self, id: ::core::option::Option<::jsonodm::id::ObjectId>) {
                self.#id = id;
            }

            fn collection_name() -> ::core::option::Option<&'static str> {
                #collection
            }
        }
    })
}

/// Reads `#[record(collection = "...")]` from the type. A bare `collection` yields "".
fn collection_attr(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                collection = Some(match meta.value() {
                    Ok(value) => value.parse::<LitStr>()?.value(),
                    Err(_) => String::new(),
                });
                Ok(())
            } else {
                Err(meta.error("expected `collection`"))
            }
        })?;
    }

    Ok(collection)
}

/// Finds the field marked `#[record(id)]`, falling back to a field named `id`.
fn id_field(input: &DeriveInput) -> syn::Result<Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new(input.span(), "Record requires named fields")),
        },
        _ => return Err(syn::Error::new(input.span(), "Record can only be derived for structs")),
    };

    let mut marked = None;

    for field in fields {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    if marked.is_some() {
                        return Err(meta.error("only one field can be marked `#[record(id)]`"));
                    }
                    marked = field.ident.clone();
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;
        }
    }

    marked
        .or_else(|| {
            fields
                .iter()
                .filter_map(|field| field.ident.clone())
                .find(|ident| ident == "id")
        })
        .ok_or_else(|| syn::Error::new(
            input.ident.span(),
            "Record needs an `id` field or a field marked `#[record(id)]`",
        ))
}
