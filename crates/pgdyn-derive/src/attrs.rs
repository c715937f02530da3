//! Field-level `#[pgdyn(...)]` attribute parsing.

use syn::{Result, Token};

/// Parsed `#[pgdyn(column = "...", primary_key)]`.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub column: Option<syn::LitStr>,
    pub primary_key: bool,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "primary_key" {
                attr.primary_key = true;
            } else if ident == "column" {
                let _: Token![=] = input.parse()?;
                attr.column = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown pgdyn attribute `{ident}` (expected `column` or `primary_key`)"),
                ));
            }

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

/// Merge every `#[pgdyn(...)]` on a field.
pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("pgdyn") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
        merged.primary_key |= parsed.primary_key;
    }
    Ok(merged)
}
