use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::attrs::field_attr;

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            _ => None,
        },
        Data::Enum(_) => None,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity cannot be derived for unions",
            ));
        }
    };

    let Some(fields) = fields else {
        return Ok(quote! {
            impl #impl_generics ::pgdyn::Entity for #name #ty_generics #where_clause {
                fn describe() -> ::pgdyn::TableDescriptor {
                    ::pgdyn::TableDescriptor::scalar(#type_name)
                }
            }
        });
    };

    let mut specs = Vec::new();
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let field_name = ident.to_string();
        let ty = &field.ty;
        let declared_type = quote!(#ty).to_string();
        let attr = field_attr(field)?;

        let spec = match &attr.column {
            Some(column) => {
                if column.value().is_empty() {
                    return Err(syn::Error::new(
                        column.span(),
                        "column name must not be empty",
                    ));
                }
                quote! { ::pgdyn::FieldSpec::column(#field_name, #column, #declared_type) }
            }
            None if attr.primary_key => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "primary_key requires a column, e.g. #[pgdyn(column = \"id\", primary_key)]",
                ));
            }
            None => quote! { ::pgdyn::FieldSpec::transient(#field_name, #declared_type) },
        };

        specs.push(if attr.primary_key {
            quote! { #spec.primary_key() }
        } else {
            spec
        });
    }

    Ok(quote! {
        impl #impl_generics ::pgdyn::Entity for #name #ty_generics #where_clause {
            fn describe() -> ::pgdyn::TableDescriptor {
                ::pgdyn::TableDescriptor::record(#type_name)
                    #( .field(#specs) )*
            }
        }
    })
}
