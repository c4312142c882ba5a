//! Procedural macros for webrpc.
//!
//! Provides `#[derive(Adapt)]`, which makes a named-field struct usable on
//! both sides of the adaptation layer: it can be wrapped as a lazy generic
//! mapping and named as a shape target for typed materialization.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derives `Adaptable`, `ToGeneric`, and `Describe` for a named-field
/// struct.
///
/// Each field becomes one property. The property's accessor name is
/// `get_<field>` (`is_<field>` for plain `bool` fields), so the derived
/// mapping key is the field name itself. The struct must implement `Clone`:
/// converting a field value to generic clones the struct behind a shared
/// handle.
///
/// # Attributes
///
/// - `#[adapt(skip)]` - leave the field out of the adapted view.
/// - `#[adapt(key = "...")]` - override the derived mapping key.
/// - `#[adapt(accessor = "...")]` - override the accessor name the key is
///   derived from.
///
/// # Example
///
/// ```rust,ignore
/// use webrpc::Adapt;
///
/// #[derive(Adapt, Clone)]
/// struct Account {
///     name: String,
///     #[adapt(key = "URL")]
///     url: String,
///     #[adapt(skip)]
///     secret: String,
/// }
/// ```
#[proc_macro_derive(Adapt, attributes(adapt))]
pub fn derive_adapt(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    key: Option<String>,
    accessor: Option<String>,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("adapt") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else if meta.path.is_ident("key") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.key = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("accessor") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.accessor = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `key = \"...\"`, or `accessor = \"...\"`"))
            }
        })?;
    }
    Ok(attrs)
}

fn is_plain_bool(ty: &syn::Type) -> bool {
    if let syn::Type::Path(type_path) = ty {
        type_path.qself.is_none() && type_path.path.is_ident("bool")
    } else {
        false
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Adapt can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Adapt requires named fields",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Adapt does not support generic types",
        ));
    }

    let ident = &input.ident;
    let name = ident.to_string();

    let mut read_fns = Vec::new();
    let mut ty_fns = Vec::new();
    let mut property_descriptors = Vec::new();
    let mut property_specs = Vec::new();

    for field in &fields.named {
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_ty = &field.ty;

        let accessor = attrs.accessor.unwrap_or_else(|| {
            let prefix = if is_plain_bool(field_ty) { "is_" } else { "get_" };
            format!("{prefix}{field_ident}")
        });

        let read_ident = format_ident!("read_{}", field_ident);
        let ty_ident = format_ident!("describe_{}", field_ident);

        read_fns.push(quote! {
            fn #read_ident(
                receiver: &dyn ::std::any::Any,
            ) -> ::std::result::Result<::webrpc::Value, ::webrpc::adapt::AccessorError> {
                let bean = receiver
                    .downcast_ref::<#ident>()
                    .ok_or_else(|| ::webrpc::adapt::receiver_mismatch(#name))?;
                ::std::result::Result::Ok(::webrpc::ToGeneric::to_generic(&bean.#field_ident))
            }
        });

        ty_fns.push(quote! {
            fn #ty_ident() -> ::webrpc::TypeDescriptor {
                <#field_ty as ::webrpc::Describe>::type_descriptor()
            }
        });

        let key_tokens = match &attrs.key {
            Some(key) => quote! { ::std::option::Option::Some(#key) },
            None => quote! { ::std::option::Option::None },
        };

        property_descriptors.push(quote! {
            ::webrpc::adapt::PropertyDescriptor {
                accessor: #accessor,
                key: #key_tokens,
                read: #read_ident,
            }
        });

        property_specs.push(quote! {
            ::webrpc::typed::PropertySpec {
                accessor: #accessor,
                key: #key_tokens,
                ty: #ty_ident,
            }
        });
    }

    Ok(quote! {
        const _: () = {
            #(#read_fns)*
            #(#ty_fns)*

            static PROPERTIES: &[::webrpc::adapt::PropertyDescriptor] = &[
                #(#property_descriptors),*
            ];

            static SHAPE: ::webrpc::typed::ShapeDescriptor = ::webrpc::typed::ShapeDescriptor {
                name: #name,
                properties: &[#(#property_specs),*],
            };

            impl ::webrpc::adapt::Adaptable for #ident {
                fn descriptors(&self) -> &'static [::webrpc::adapt::PropertyDescriptor] {
                    PROPERTIES
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn type_label(&self) -> &'static str {
                    #name
                }
            }

            impl ::webrpc::ToGeneric for #ident {
                fn to_generic(&self) -> ::webrpc::Value {
                    ::webrpc::adapt::wrap_arc(::std::sync::Arc::new(
                        ::core::clone::Clone::clone(self),
                    ))
                }
            }

            impl ::webrpc::Describe for #ident {
                fn type_descriptor() -> ::webrpc::TypeDescriptor {
                    ::webrpc::TypeDescriptor::Shape(&SHAPE)
                }
            }
        };
    })
}
