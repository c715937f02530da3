//! Loosely-typed scalar values.
//!
//! Requests arrive as JSON, so filter values and payload entries are not typed
//! against the target column. [`Value`] keeps whatever shape the caller sent and
//! coerces it when bound to a placeholder, using the parameter type Postgres
//! inferred for that placeholder.
//!
//! - `Text` is parsed into booleans, integers, floats, timestamps, dates, uuids and json.
//! - Numbers and booleans render to text for text-like parameters.
//! - Anything else is a bind error, surfaced by the driver as an execution error.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::error::{DynError, DynResult};

type BoxError = Box<dyn Error + Sync + Send>;

/// A single scalar carried by a clause, a payload entry, or a decoded column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Arrays and objects, bound as json/jsonb.
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into the matching scalar variant.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }

    /// Render as JSON (timestamps become RFC 3339 strings).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Json(v) => v.clone(),
        }
    }

    /// Decode column `idx` of `row` by the column's declared type.
    pub fn from_column(row: &Row, idx: usize) -> DynResult<Self> {
        let column = &row.columns()[idx];
        let name = column.name();
        let ty = column.type_();

        macro_rules! get {
            ($t:ty) => {
                row.try_get::<_, Option<$t>>(idx)
                    .map_err(|e| DynError::decode(name, e.to_string()))?
            };
        }

        let value = match *ty {
            Type::BOOL => get!(bool).map(Value::Bool),
            Type::INT2 => get!(i16).map(|v| Value::Int(v.into())),
            Type::INT4 => get!(i32).map(|v| Value::Int(v.into())),
            Type::INT8 => get!(i64).map(Value::Int),
            Type::OID => get!(u32).map(|v| Value::Int(v.into())),
            Type::FLOAT4 => get!(f32).map(|v| Value::Float(v.into())),
            Type::FLOAT8 => get!(f64).map(Value::Float),
            Type::TIMESTAMP => get!(NaiveDateTime).map(|v| Value::Timestamp(v.and_utc())),
            Type::TIMESTAMPTZ => get!(DateTime<Utc>).map(Value::Timestamp),
            Type::DATE => get!(NaiveDate).map(|v| Value::Text(v.to_string())),
            Type::UUID => get!(uuid::Uuid).map(|v| Value::Text(v.to_string())),
            Type::JSON | Type::JSONB => get!(serde_json::Value).map(Value::Json),
            _ if <&str as ToSql>::accepts(ty) => get!(String).map(Value::Text),
            _ => {
                return Err(DynError::decode(
                    name,
                    format!("unsupported column type {ty}"),
                ));
            }
        };

        Ok(value.unwrap_or(Value::Null))
    }

    fn bind_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match *ty {
            Type::BOOL => parse_bool(s)?.to_sql(ty, out),
            Type::INT2 => s.trim().parse::<i16>()?.to_sql(ty, out),
            Type::INT4 => s.trim().parse::<i32>()?.to_sql(ty, out),
            Type::INT8 => s.trim().parse::<i64>()?.to_sql(ty, out),
            Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
            Type::TIMESTAMP => parse_naive_timestamp(s)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(s)?.to_sql(ty, out),
            Type::DATE => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out),
            Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
            Type::JSON | Type::JSONB => {
                let json = serde_json::from_str::<serde_json::Value>(s)
                    .unwrap_or_else(|_| serde_json::Value::String(s.to_string()));
                json.to_sql(ty, out)
            }
            _ if <&str as ToSql>::accepts(ty) => s.to_sql(ty, out),
            _ => Err(format!("cannot bind text to parameter of type {ty}").into()),
        }
    }

    fn bind_int(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match *ty {
            Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
            Type::INT8 => i.to_sql(ty, out),
            Type::FLOAT4 => (i as f32).to_sql(ty, out),
            Type::FLOAT8 => (i as f64).to_sql(ty, out),
            Type::BOOL => match i {
                0 => false.to_sql(ty, out),
                1 => true.to_sql(ty, out),
                _ => Err(format!("cannot bind {i} to a boolean parameter").into()),
            },
            Type::JSON | Type::JSONB => serde_json::Value::from(i).to_sql(ty, out),
            _ if <&str as ToSql>::accepts(ty) => i.to_string().as_str().to_sql(ty, out),
            _ => Err(format!("cannot bind integer to parameter of type {ty}").into()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Text(s) => Value::bind_text(s, ty, out),
            Value::Int(i) => Value::bind_int(*i, ty, out),
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 if f.fract() == 0.0 => {
                    Value::bind_int(*f as i64, ty, out)
                }
                Type::JSON | Type::JSONB => Value::Float(*f).to_json().to_sql(ty, out),
                _ if <&str as ToSql>::accepts(ty) => f.to_string().as_str().to_sql(ty, out),
                _ => Err(format!("cannot bind float to parameter of type {ty}").into()),
            },
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::Bool(*b).to_sql(ty, out),
                _ if <&str as ToSql>::accepts(ty) => {
                    (if *b { "true" } else { "false" }).to_sql(ty, out)
                }
                _ => Err(format!("cannot bind boolean to parameter of type {ty}").into()),
            },
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMPTZ => ts.to_sql(ty, out),
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                Type::DATE => ts.date_naive().to_sql(ty, out),
                _ if <&str as ToSql>::accepts(ty) => ts.to_rfc3339().as_str().to_sql(ty, out),
                _ => Err(format!("cannot bind timestamp to parameter of type {ty}").into()),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ if <&str as ToSql>::accepts(ty) => v.to_string().as_str().to_sql(ty, out),
                _ => Err(format!("cannot bind json to parameter of type {ty}").into()),
            },
        }
    }

    // Coercion is decided per placeholder in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        other => Err(format!("invalid boolean literal '{other}'").into()),
    }
}

fn parse_naive_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    Err(format!("invalid timestamp literal '{s}'").into())
}

fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, BoxError> {
    match DateTime::parse_from_rfc3339(s.trim()) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(_) => parse_naive_timestamp(s).map(|ts| ts.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, ty: &Type) -> Result<BytesMut, BoxError> {
        let mut out = BytesMut::new();
        value.to_sql(ty, &mut out)?;
        Ok(out)
    }

    #[test]
    fn deserializes_json_scalars_to_matching_variants() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 30, 1.5, "a", [1], {"k": 1}]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(30),
                Value::Float(1.5),
                Value::Text("a".into()),
                Value::Json(serde_json::json!([1])),
                Value::Json(serde_json::json!({"k": 1})),
            ]
        );
    }

    #[test]
    fn text_binds_as_integer() {
        let bytes = encode(&Value::from("42"), &Type::INT4).unwrap();
        assert_eq!(&bytes[..], &42i32.to_be_bytes());
    }

    #[test]
    fn text_binds_as_boolean() {
        assert_eq!(&encode(&Value::from("true"), &Type::BOOL).unwrap()[..], &[1]);
        assert_eq!(&encode(&Value::from("f"), &Type::BOOL).unwrap()[..], &[0]);
        assert!(encode(&Value::from("maybe"), &Type::BOOL).is_err());
    }

    #[test]
    fn integer_binds_as_text() {
        let bytes = encode(&Value::Int(30), &Type::TEXT).unwrap();
        assert_eq!(&bytes[..], b"30");
    }

    #[test]
    fn integer_out_of_range_is_rejected() {
        assert!(encode(&Value::Int(70_000), &Type::INT2).is_err());
    }

    #[test]
    fn null_binds_as_sql_null() {
        let mut out = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::INT8, &mut out).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn text_to_timestamp_accepts_common_layouts() {
        assert!(parse_naive_timestamp("2024-05-01T10:20:30Z").is_ok());
        assert!(parse_naive_timestamp("2024-05-01 10:20:30.123").is_ok());
        assert!(parse_naive_timestamp("2024-05-01").is_ok());
        assert!(parse_naive_timestamp("yesterday").is_err());
        assert!(parse_timestamptz("2024-05-01T10:20:30+02:00").is_ok());
    }

    #[test]
    fn text_to_unsupported_type_is_an_error() {
        assert!(encode(&Value::from("x"), &Type::BYTEA).is_err());
    }

    #[test]
    fn json_round_trips_through_to_json() {
        let v = Value::from_json(serde_json::json!({"a": [1, 2]}));
        assert_eq!(v.to_json(), serde_json::json!({"a": [1, 2]}));
        assert_eq!(Value::from_json(serde_json::json!(7)), Value::Int(7));
    }

    #[test]
    fn display_matches_the_bound_text() {
        assert_eq!(Value::from("42").to_string(), "42");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
