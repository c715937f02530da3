//! Parameterized statement builder.
//!
//! [`Statement`] keeps the SQL text and its bound arguments side by side and
//! hands out `$1, $2, ...` placeholders from a single counter, so fragments can
//! be appended in any order without tracking indices by hand.

use std::fmt;
use tokio_postgres::types::ToSql;

use crate::value::Value;

/// A SQL string with positional `$n` placeholders and the values bound to them.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
}

impl Statement {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            sql: initial_sql.into(),
            args: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append the next placeholder and bind `value` to it.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.args.push(value.into());
        self.sql.push('$');
        self.sql.push_str(&self.args.len().to_string());
        self
    }

    /// Append an identifier wrapped in double quotes.
    ///
    /// The name is neither validated nor escaped: a caller who controls it
    /// controls the statement.
    pub fn push_quoted(&mut self, ident: &str) -> &mut Self {
        self.sql.push('"');
        self.sql.push_str(ident);
        self.sql.push('"');
        self
    }

    /// Append `items` separated by `sep`, rendering each with `f`.
    pub fn push_separated<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        sep: &str,
        mut f: impl FnMut(&mut Self, T),
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            f(self, item);
        }
        self
    }

    /// The rendered SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound arguments, in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Number of placeholders emitted so far.
    pub fn param_count(&self) -> usize {
        self.args.len()
    }

    /// Arguments as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
