//! # pgdyn
//!
//! Dynamic, model-agnostic PostgreSQL data access.
//!
//! ## Features
//!
//! - **Declarative requests**: a model name, a list of filter clauses, a payload
//!   and read options describe a call; no per-model code is needed
//! - **Parameterized SQL**: values are always bound as `$n` placeholders
//! - **Guarded writes**: UPDATE and DELETE refuse to run without a WHERE
//! - **Schema bootstrap**: `CREATE TABLE IF NOT EXISTS` from `#[derive(Entity)]` types
//! - **One shared connection** with an explicit lifecycle
//!
//! ## Translating a request
//!
//! ```ignore
//! use pgdyn::{Operation, QueryRequest, translate};
//!
//! let request: QueryRequest = serde_json::from_str(r#"{
//!     "model": "users",
//!     "where": [
//!         {"field": "id", "operator": "eq", "value": "42"},
//!         {"field": "active", "operator": "eq", "value": "true", "connector": "AND"}
//!     ]
//! }"#)?;
//!
//! let statement = translate(Operation::FindMany, &request)?;
//! assert_eq!(statement.sql(), r#"SELECT * FROM "users" WHERE "id" = $1 AND "active" = $2"#);
//! ```
//!
//! ## Running it
//!
//! ```ignore
//! use pgdyn::{ConnectionManager, DatabaseConfig, Engine};
//!
//! let engine = Engine::new(ConnectionManager::new(DatabaseConfig::from_env()));
//! let outcome = engine.run(Operation::FindMany, &request).await?;
//! println!("{}", outcome.to_json());
//! ```
//!
//! ## Creating tables
//!
//! ```ignore
//! use pgdyn::{Entity, SchemaRegistry};
//!
//! #[derive(Entity)]
//! struct Session {
//!     #[pgdyn(column = "id", primary_key)]
//!     id: String,
//!     #[pgdyn(column = "userId")]
//!     user_id: String,
//! }
//!
//! let registry = SchemaRegistry::new().with::<Session>();
//! registry.apply(&manager).await?;
//! ```

pub mod clause;
pub mod connection;
pub mod engine;
pub mod error;
pub mod schema;
pub mod statement;
pub mod store;
pub mod translate;
pub mod value;

pub use clause::{
    Clause, Connector, FilterSet, Operation, Operator, Payload, QueryRequest, ReadOptions,
    SortKey, SortOrder,
};
pub use connection::{ConnectionManager, ConnectionState, DatabaseConfig};
pub use engine::{Engine, Outcome};
pub use error::{DynError, DynResult};
pub use schema::{
    Entity, FieldSpec, SchemaRegistry, SqlType, TableDescriptor, TypeShape, synthesize,
    synthesize_entity,
};
pub use statement::Statement;
pub use store::{Record, RecordSet, RecordStore};
pub use translate::translate;
pub use value::Value;

#[cfg(feature = "derive")]
pub use pgdyn_derive::Entity;
