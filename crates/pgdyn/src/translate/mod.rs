//! Request -> SQL translation.
//!
//! Each operation turns a model name, a [`FilterSet`] and (for writes) a
//! [`Payload`] into a [`Statement`]. All placeholders of one statement come
//! from a single counter: for `UPDATE` the `SET` values are numbered first and
//! the `WHERE` values continue from there.
//!
//! | operation              | empty filter        | empty payload |
//! |------------------------|---------------------|---------------|
//! | count, find-many       | no `WHERE` emitted  | n/a           |
//! | find-one               | `where required`    | n/a           |
//! | create                 | ignored             | `empty payload` |
//! | update, update-many    | `where required`    | `empty payload` |
//! | delete, delete-many    | `where required`    | n/a           |
//!
//! Identifiers are double-quoted but not validated or escaped.
//!
//! The `update`/`update-many` and `delete`/`delete-many` pairs build the same
//! statement: the single-row variants are not limited to one row.

use crate::clause::{FilterSet, Operation, Payload, QueryRequest, ReadOptions};
use crate::error::{DynError, DynResult};
use crate::statement::Statement;

#[cfg(test)]
mod tests;

/// Translate `request` for `operation`.
pub fn translate(operation: Operation, request: &QueryRequest) -> DynResult<Statement> {
    let model = request.model.as_str();
    let filter = &request.filter;
    match operation {
        Operation::Count => count(model, filter),
        Operation::FindOne => find_one(model, filter),
        Operation::FindMany => find_many(model, filter, &request.read),
        Operation::Create => create(model, require_payload(request)?),
        Operation::Update => update(model, require_payload(request)?, filter),
        Operation::UpdateMany => update_many(model, require_payload(request)?, filter),
        Operation::Delete => delete(model, filter),
        Operation::DeleteMany => delete_many(model, filter),
    }
}

/// `SELECT COUNT(*) FROM "<model>" [WHERE ...]`
pub fn count(model: &str, filter: &FilterSet) -> DynResult<Statement> {
    let mut q = select_from("SELECT COUNT(*) FROM ", model)?;
    push_where(&mut q, filter)?;
    Ok(q)
}

/// `SELECT * FROM "<model>" [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET m]`
pub fn find_many(model: &str, filter: &FilterSet, read: &ReadOptions) -> DynResult<Statement> {
    let mut q = select_from("SELECT * FROM ", model)?;
    push_where(&mut q, filter)?;
    push_read_options(&mut q, read)?;
    Ok(q)
}

/// Same statement as [`find_many`] without read options; requires a filter.
pub fn find_one(model: &str, filter: &FilterSet) -> DynResult<Statement> {
    require_filter(filter)?;
    let mut q = select_from("SELECT * FROM ", model)?;
    push_where(&mut q, filter)?;
    Ok(q)
}

/// `INSERT INTO "<model>" ("c1", "c2") VALUES ($1, $2)`
pub fn create(model: &str, payload: &Payload) -> DynResult<Statement> {
    require_model(model)?;
    if payload.is_empty() {
        return Err(DynError::validation("empty payload"));
    }
    require_columns(payload)?;

    let mut q = Statement::new("INSERT INTO ");
    q.push_quoted(model).push(" (");
    q.push_separated(payload.iter(), ", ", |q, (col, _)| {
        q.push_quoted(col);
    });
    q.push(") VALUES (");
    q.push_separated(payload.iter(), ", ", |q, (_, value)| {
        q.push_bind(value.clone());
    });
    q.push(")");
    Ok(q)
}

/// `UPDATE <model> SET c1 = $1, ... WHERE "f" = $k ...`
///
/// The table and `SET` columns are emitted bare; only `WHERE` fields are
/// quoted.
pub fn update(model: &str, payload: &Payload, filter: &FilterSet) -> DynResult<Statement> {
    require_model(model)?;
    if payload.is_empty() {
        return Err(DynError::validation("empty payload"));
    }
    require_columns(payload)?;
    require_filter(filter)?;

    let mut q = Statement::new("UPDATE ");
    q.push(model).push(" SET ");
    q.push_separated(payload.iter(), ", ", |q, (col, value)| {
        q.push(col).push(" = ").push_bind(value.clone());
    });
    push_where(&mut q, filter)?;
    Ok(q)
}

/// Identical to [`update`]; the caller's intent is the only difference.
pub fn update_many(model: &str, payload: &Payload, filter: &FilterSet) -> DynResult<Statement> {
    update(model, payload, filter)
}

/// `DELETE FROM "<model>" WHERE ...`
pub fn delete(model: &str, filter: &FilterSet) -> DynResult<Statement> {
    require_filter(filter)?;
    let mut q = select_from("DELETE FROM ", model)?;
    push_where(&mut q, filter)?;
    Ok(q)
}

/// Identical to [`delete`].
pub fn delete_many(model: &str, filter: &FilterSet) -> DynResult<Statement> {
    delete(model, filter)
}

fn select_from(prefix: &str, model: &str) -> DynResult<Statement> {
    require_model(model)?;
    let mut q = Statement::new(prefix);
    q.push_quoted(model);
    Ok(q)
}

/// Append ` WHERE "<field>" = $n [AND|OR ...]`, or nothing for an empty filter.
fn push_where(q: &mut Statement, filter: &FilterSet) -> DynResult<()> {
    if filter.is_empty() {
        return Ok(());
    }

    q.push(" WHERE ");
    for (i, clause) in filter.iter().enumerate() {
        if clause.field.is_empty() {
            return Err(DynError::validation("empty column name"));
        }
        if !clause.operator.is_recognized() {
            tracing::warn!(
                target: "pgdyn.translate",
                field = %clause.field,
                operator = ?clause.operator,
                "unrecognized operator, comparing with ="
            );
        }
        if i > 0 {
            let connector = clause.connector.as_sql().ok_or_else(|| {
                DynError::validation(format!(
                    "unknown connector '{}' on '{}'",
                    String::from(clause.connector.clone()),
                    clause.field
                ))
            })?;
            q.push(" ").push(connector).push(" ");
        }
        q.push_quoted(&clause.field)
            .push(" ")
            .push(clause.operator.sql_token())
            .push(" ")
            .push_bind(clause.value.clone());
    }
    Ok(())
}

fn push_read_options(q: &mut Statement, read: &ReadOptions) -> DynResult<()> {
    let keys = read.sort_keys()?;
    if !keys.is_empty() {
        q.push(" ORDER BY ");
        q.push_separated(keys, ", ", |q, key| {
            q.push_quoted(&key.column).push(" ").push(key.order.as_sql());
        });
    }
    if let Some(limit) = read.effective_limit() {
        q.push(" LIMIT ").push(&limit.to_string());
    }
    if let Some(offset) = read.effective_offset() {
        q.push(" OFFSET ").push(&offset.to_string());
    }
    Ok(())
}

fn require_model(model: &str) -> DynResult<()> {
    if model.is_empty() {
        return Err(DynError::validation("model required"));
    }
    Ok(())
}

fn require_filter(filter: &FilterSet) -> DynResult<()> {
    if filter.is_empty() {
        return Err(DynError::validation("where required"));
    }
    Ok(())
}

fn require_columns(payload: &Payload) -> DynResult<()> {
    if payload.iter().any(|(col, _)| col.is_empty()) {
        return Err(DynError::validation("empty column name"));
    }
    Ok(())
}

fn require_payload(request: &QueryRequest) -> DynResult<&Payload> {
    request
        .payload
        .as_ref()
        .ok_or_else(|| DynError::validation("empty payload"))
}
