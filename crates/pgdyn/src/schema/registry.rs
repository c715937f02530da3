use crate::error::{DynError, DynResult};
use crate::statement::Statement;
use crate::store::RecordStore;

use super::{Entity, TableDescriptor, synthesize};

/// Ordered set of entity descriptors to create at startup.
///
/// Registration order is statement order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type. Registering the same type name twice keeps the
    /// first registration.
    pub fn register<E: Entity>(&mut self) -> &mut Self {
        self.register_descriptor(E::describe())
    }

    pub fn register_descriptor(&mut self, descriptor: TableDescriptor) -> &mut Self {
        if !self.contains(&descriptor.type_name) {
            self.tables.push(descriptor);
        }
        self
    }

    pub fn with<E: Entity>(mut self) -> Self {
        self.register::<E>();
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.tables.iter().any(|t| t.type_name == type_name)
    }

    pub fn get(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.table_name() == table_name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// One `CREATE TABLE IF NOT EXISTS` per registered entity.
    pub fn statements(&self) -> DynResult<Vec<String>> {
        self.tables
            .iter()
            .map(|t| {
                synthesize(t).map_err(|e| match e {
                    DynError::Validation(msg) => {
                        DynError::Validation(format!("{}: {msg}", t.type_name))
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// All statements as one SQL script, each followed by a blank line.
    pub fn export(&self) -> DynResult<String> {
        let mut script = String::new();
        for sql in self.statements()? {
            script.push_str(&sql);
            script.push_str("\n\n");
        }
        Ok(script)
    }

    /// Execute every statement against `store`, stopping at the first failure.
    ///
    /// Returns the number of statements executed.
    pub async fn apply<S: RecordStore>(&self, store: &S) -> DynResult<usize> {
        let statements = self.statements()?;
        for (i, sql) in statements.iter().enumerate() {
            let table = self.tables[i].table_name();
            tracing::info!(target: "pgdyn.schema", table = %table, "ensuring table");
            store.execute(&Statement::new(sql.as_str())).await?;
        }
        Ok(statements.len())
    }
}
