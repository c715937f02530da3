//! Declarative request shapes: filter clauses, payloads and read options.
//!
//! These mirror the JSON bodies the transport layer receives:
//!
//! ```json
//! {
//!   "model": "user",
//!   "where": [
//!     { "field": "id", "operator": "eq", "value": "42" },
//!     { "field": "active", "operator": "eq", "value": "true", "connector": "AND" }
//!   ],
//!   "limit": 10,
//!   "sortBy": ["createdAt:desc"]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DynError;
use crate::value::Value;

/// Comparison operator of a clause.
///
/// Only `eq` is recognized. Anything else is kept verbatim but still renders
/// as `=`. A missing or `null` operator is `eq`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Operator {
    #[default]
    Eq,
    Unrecognized(String),
}

impl Operator {
    /// SQL token emitted for this operator.
    pub fn sql_token(&self) -> &'static str {
        "="
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Operator::Eq)
    }
}

impl From<Option<String>> for Operator {
    fn from(s: Option<String>) -> Self {
        match s {
            Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("eq") => Operator::Unrecognized(s),
            _ => Operator::Eq,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Operator::from(Some(s))
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Eq => "eq".to_string(),
            Operator::Unrecognized(s) => s,
        }
    }
}

/// Logical connector joining a clause to the one before it.
///
/// Decoding never fails: a missing, `null` or empty connector is `And`, and
/// any other unknown string is kept as `Unrecognized`. The connector of the
/// first clause is never read, so only later clauses can be rejected, at
/// translation time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Connector {
    #[default]
    And,
    Or,
    Unrecognized(String),
}

impl Connector {
    /// SQL keyword, or `None` for an unrecognized connector.
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            Connector::And => Some("AND"),
            Connector::Or => Some("OR"),
            Connector::Unrecognized(_) => None,
        }
    }
}

impl From<Option<String>> for Connector {
    fn from(s: Option<String>) -> Self {
        let Some(s) = s else {
            return Connector::And;
        };
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "AND" => Connector::And,
            "OR" => Connector::Or,
            _ => Connector::Unrecognized(s),
        }
    }
}

impl From<Connector> for String {
    fn from(c: Connector) -> Self {
        match c {
            Connector::Unrecognized(s) => s,
            known => known.as_sql().unwrap_or_default().to_string(),
        }
    }
}

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default = "null_value")]
    pub value: Value,
    /// Ignored on the first clause of a [`FilterSet`].
    #[serde(default)]
    pub connector: Connector,
}

fn null_value() -> Value {
    Value::Null
}

impl Clause {
    /// `field = value`, joined with `AND`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: value.into(),
            connector: Connector::And,
        }
    }

    /// `field = value`, joined with `OR`.
    pub fn or_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            connector: Connector::Or,
            ..Self::eq(field, value)
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Operator::from(operator.into());
        self
    }
}

/// Ordered clauses forming a WHERE predicate, evaluated left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(pub Vec<Clause>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) -> &mut Self {
        self.0.push(clause);
        self
    }

    pub fn with(mut self, clause: Clause) -> Self {
        self.0.push(clause);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.0.iter()
    }
}

impl From<Vec<Clause>> for FilterSet {
    fn from(clauses: Vec<Clause>) -> Self {
        Self(clauses)
    }
}

impl FromIterator<Clause> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Column -> value mapping for inserts and updates.
///
/// Insertion order is kept: the column list and the bound arguments are both
/// produced by iterating it once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub IndexMap<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, keeping its original position if already present.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term parsed from a `sortBy` entry.
///
/// Accepted forms: `col`, `-col`, `col:asc`, `col:desc`, `col asc`, `col desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
}

impl FromStr for SortKey {
    type Err = DynError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(column) = s.strip_prefix('-') {
            return SortKey::new(column, SortOrder::Desc);
        }

        let (column, dir) = match s.rsplit_once(':').or_else(|| s.rsplit_once(' ')) {
            Some((c, d)) => (c, Some(d.trim())),
            None => (s, None),
        };
        let order = match dir.map(|d| d.to_ascii_lowercase()) {
            None => SortOrder::Asc,
            Some(d) if d == "asc" => SortOrder::Asc,
            Some(d) if d == "desc" => SortOrder::Desc,
            Some(d) => {
                return Err(DynError::validation(format!(
                    "invalid sort direction '{d}' in '{s}'"
                )));
            }
        };
        SortKey::new(column, order)
    }
}

impl SortKey {
    fn new(column: &str, order: SortOrder) -> Result<Self, DynError> {
        let column = column.trim();
        if column.is_empty() {
            return Err(DynError::validation("empty sort column"));
        }
        Ok(Self {
            column: column.to_string(),
            order,
        })
    }
}

/// Pagination and ordering for `find-many`.
///
/// A `limit` or `offset` of zero means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOptions {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub sort_by: Vec<String>,
}

impl ReadOptions {
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|n| *n > 0)
    }

    pub fn effective_offset(&self) -> Option<u64> {
        self.offset.filter(|n| *n > 0)
    }

    pub fn sort_keys(&self) -> Result<Vec<SortKey>, DynError> {
        self.sort_by.iter().map(|s| s.parse()).collect()
    }
}

/// The envelope handed to the translator for one inbound call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub model: String,
    #[serde(default, rename = "where")]
    pub filter: FilterSet,
    /// Insert (`data`) or update (`update`) payload.
    #[serde(default, rename = "data", alias = "update")]
    pub payload: Option<Payload>,
    #[serde(flatten)]
    pub read: ReadOptions,
}

impl QueryRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, clause: Clause) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.read.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.read.offset = Some(offset);
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        self.read.sort_by.push(key.into());
        self
    }
}

/// The kind of statement a request translates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    FindOne,
    FindMany,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Count,
        Operation::FindOne,
        Operation::FindMany,
        Operation::Create,
        Operation::Update,
        Operation::UpdateMany,
        Operation::Delete,
        Operation::DeleteMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::FindOne => "find-one",
            Operation::FindMany => "find-many",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateMany => "update-many",
            Operation::Delete => "delete",
            Operation::DeleteMany => "delete-many",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DynError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DynError::validation(format!("unknown operation '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_request_body() {
        let req: QueryRequest = serde_json::from_str(
            r#"{
                "model": "users",
                "where": [
                    {"field": "id", "operator": "eq", "value": "42", "connector": ""},
                    {"field": "active", "operator": "eq", "value": "true", "connector": "AND"}
                ],
                "limit": 10,
                "offset": 0,
                "sortBy": ["createdAt:desc"]
            }"#,
        )
        .unwrap();

        assert_eq!(req.model, "users");
        assert_eq!(req.filter.len(), 2);
        assert_eq!(req.filter.0[0].value, Value::from("42"));
        assert_eq!(req.filter.0[1].connector, Connector::And);
        assert_eq!(req.read.effective_limit(), Some(10));
        assert_eq!(req.read.effective_offset(), None);
        assert_eq!(req.read.sort_by, vec!["createdAt:desc".to_string()]);
        assert!(req.payload.is_none());
    }

    #[test]
    fn payload_keeps_declaration_order() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"model": "users", "data": {"name": "a", "age": "30"}}"#)
                .unwrap();
        let payload = req.payload.unwrap();
        let cols: Vec<&str> = payload.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(cols, vec!["name", "age"]);
    }

    #[test]
    fn update_key_is_accepted_for_payload() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"model": "users", "update": {"name": "b"}}"#).unwrap();
        assert_eq!(req.payload.unwrap().len(), 1);
    }

    #[test]
    fn unknown_operator_is_kept_but_renders_as_equality() {
        let clause: Clause =
            serde_json::from_str(r#"{"field": "age", "operator": "gt", "value": 3}"#).unwrap();
        assert_eq!(clause.operator, Operator::Unrecognized("gt".into()));
        assert_eq!(clause.operator.sql_token(), "=");
        assert!(!clause.operator.is_recognized());
    }

    #[test]
    fn connector_is_case_insensitive_and_lenient() {
        let c: Clause =
            serde_json::from_str(r#"{"field": "a", "value": 1, "connector": "or"}"#).unwrap();
        assert_eq!(c.connector, Connector::Or);

        let c: Clause =
            serde_json::from_str(r#"{"field": "a", "value": 1, "connector": "XOR"}"#).unwrap();
        assert_eq!(c.connector, Connector::Unrecognized("XOR".into()));
        assert_eq!(c.connector.as_sql(), None);
    }

    #[test]
    fn null_connector_and_operator_take_defaults() {
        let req: QueryRequest = serde_json::from_str(
            r#"{"model": "users", "where": [
                {"field": "id", "operator": null, "value": "1", "connector": null}
            ]}"#,
        )
        .unwrap();
        let clause = &req.filter.0[0];
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.connector, Connector::And);
    }

    #[test]
    fn missing_value_is_null() {
        let c: Clause = serde_json::from_str(r#"{"field": "a"}"#).unwrap();
        assert!(c.value.is_null());
    }

    #[test]
    fn sort_key_forms() {
        let asc: SortKey = "name".parse().unwrap();
        assert_eq!(asc.order, SortOrder::Asc);
        let desc: SortKey = "-createdAt".parse().unwrap();
        assert_eq!(desc.column, "createdAt");
        assert_eq!(desc.order, SortOrder::Desc);
        let colon: SortKey = "createdAt:DESC".parse().unwrap();
        assert_eq!(colon.order, SortOrder::Desc);
        let spaced: SortKey = "name asc".parse().unwrap();
        assert_eq!(spaced.column, "name");
        assert!("name:sideways".parse::<SortKey>().is_err());
        assert!("-".parse::<SortKey>().is_err());
    }

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!("upsert".parse::<Operation>().is_err());
    }
}
