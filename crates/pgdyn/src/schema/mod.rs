//! `CREATE TABLE` synthesis from declared record types.
//!
//! Entities describe themselves through [`Entity::describe`] (usually derived
//! with `#[derive(Entity)]`). Only fields carrying a column name are
//! persisted; the SQL type of each column is inferred from the field's
//! declared Rust type.
//!
//! ```ignore
//! use pgdyn::Entity;
//!
//! #[derive(Entity)]
//! struct User {
//!     #[pgdyn(column = "id", primary_key)]
//!     id: String,
//!     #[pgdyn(column = "emailVerified")]
//!     email_verified: bool,
//!     scratch: Vec<u8>, // not persisted
//! }
//!
//! let sql = pgdyn::synthesize(&User::describe())?;
//! // CREATE TABLE IF NOT EXISTS "user" ("id" TEXT, "emailVerified" BOOLEAN, PRIMARY KEY ("id"));
//! ```

mod registry;


pub use registry::SchemaRegistry;

use std::fmt;

use crate::error::{DynError, DynResult};

/// Column types the synthesizer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Text,
    Integer,
    Boolean,
    Real,
    Timestamp,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Real => "REAL",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }

    /// Infer the column type from a declared Rust type such as `i64`,
    /// `Option<String>` or `chrono::DateTime<chrono::Utc>`.
    ///
    /// Unknown types map to `TEXT`.
    pub fn infer(declared_type: &str) -> Self {
        let compact: String = declared_type
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let ty = unwrap_option(&compact);
        let ty = ty.trim_start_matches('&');
        let ty = ty.strip_prefix("'static").unwrap_or(ty);
        let base = ty.split('<').next().unwrap_or(ty);
        let last = base.rsplit("::").next().unwrap_or(base);

        match last {
            "String" | "str" | "char" => SqlType::Text,
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => SqlType::Integer,
            "bool" => SqlType::Boolean,
            "f32" | "f64" => SqlType::Real,
            "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime"
            | "PrimitiveDateTime" => SqlType::Timestamp,
            _ => SqlType::Text,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

fn unwrap_option(ty: &str) -> &str {
    let mut ty = ty;
    loop {
        let base = ty.split('<').next().unwrap_or(ty);
        let is_option = base.rsplit("::").next() == Some("Option");
        match (is_option, ty.find('<'), ty.ends_with('>')) {
            (true, Some(open), true) => ty = &ty[open + 1..ty.len() - 1],
            _ => return ty,
        }
    }
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in the record type.
    pub name: String,
    /// Column name; `None` means the field is not persisted.
    pub column: Option<String>,
    /// The field's declared type, as written.
    pub declared_type: String,
    pub primary_key: bool,
}

impl FieldSpec {
    /// A persisted field.
    pub fn column(
        name: impl Into<String>,
        column: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: Some(column.into()),
            declared_type: declared_type.into(),
            primary_key: false,
        }
    }

    /// A field without a column tag.
    pub fn transient(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            declared_type: declared_type.into(),
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.column.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn sql_type(&self) -> SqlType {
        SqlType::infer(&self.declared_type)
    }
}

/// What kind of type a descriptor was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// A struct with named fields.
    Record,
    /// Anything else (enums, tuples, primitives).
    Scalar,
}

/// Declared description of a record type, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub type_name: String,
    pub shape: TypeShape,
    pub fields: Vec<FieldSpec>,
}

impl TableDescriptor {
    pub fn record(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            shape: TypeShape::Record,
            fields: Vec::new(),
        }
    }

    pub fn scalar(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            shape: TypeShape::Scalar,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Table name: the type name lowercased.
    pub fn table_name(&self) -> String {
        self.type_name.to_lowercase()
    }

    /// Persisted fields, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_persisted())
    }
}

/// A record type with a fixed, declared set of persisted fields.
pub trait Entity {
    fn describe() -> TableDescriptor;
}

/// Build `CREATE TABLE IF NOT EXISTS` for `descriptor`.
///
/// Output is a pure function of the descriptor.
pub fn synthesize(descriptor: &TableDescriptor) -> DynResult<String> {
    if descriptor.shape != TypeShape::Record {
        return Err(DynError::validation("not a record type"));
    }

    let mut columns = Vec::new();
    let mut primary_keys = Vec::new();
    for field in descriptor.columns() {
        let Some(column) = field.column.as_deref() else {
            continue;
        };
        columns.push(format!(r#""{column}" {}"#, field.sql_type()));
        if field.primary_key {
            primary_keys.push(format!(r#""{column}""#));
        }
    }

    if columns.is_empty() {
        return Err(DynError::validation("no persisted fields"));
    }

    let mut sql = format!(
        r#"CREATE TABLE IF NOT EXISTS "{}" ({}"#,
        descriptor.table_name(),
        columns.join(", ")
    );
    if !primary_keys.is_empty() {
        sql.push_str(&format!(", PRIMARY KEY ({})", primary_keys.join(", ")));
    }
    sql.push_str(");");
    Ok(sql)
}

/// [`synthesize`] for an [`Entity`] type.
pub fn synthesize_entity<E: Entity>() -> DynResult<String> {
    synthesize(&E::describe())
}
