//! Derive macros for pgdyn
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;

/// Derive `Entity` for a struct.
///
/// # Example
///
/// ```ignore
/// use pgdyn::Entity;
///
/// #[derive(Entity)]
/// struct Account {
///     #[pgdyn(column = "id", primary_key)]
///     id: String,
///     #[pgdyn(column = "userId")]
///     user_id: String,
///     #[pgdyn(column = "accessTokenExpiresAt")]
///     access_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
///     // no attribute: not persisted
///     cached_profile: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[pgdyn(column = "name")]` - Persist the field as column `name`
/// - `#[pgdyn(primary_key)]` - Include the column in the primary key
///
/// The table name is the struct name lowercased. Enums and tuple structs
/// produce a descriptor that `synthesize` rejects as "not a record type".
#[proc_macro_derive(Entity, attributes(pgdyn))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
