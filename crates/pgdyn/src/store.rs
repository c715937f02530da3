//! Statement execution seam.
//!
//! [`RecordStore`] is what the engine talks to. It is implemented for a bare
//! [`tokio_postgres::Client`] and for the shared [`ConnectionManager`]; tests
//! substitute an in-memory recorder.
//!
//! [`ConnectionManager`]: crate::connection::ConnectionManager

use futures_util::TryStreamExt;
use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_postgres::Row;

use crate::error::{DynError, DynResult};
use crate::statement::Statement;
use crate::value::Value;

/// One result row: column name -> value, in result column order.
pub type Record = IndexMap<String, Value>;

/// Rows returned by a query, with the column names of the result.
///
/// `columns` is populated even when no rows come back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row given as values in column order.
    pub fn push_row(&mut self, values: impl IntoIterator<Item = Value>) {
        let record = self.columns.iter().cloned().zip(values).collect();
        self.rows.push(record);
    }

    /// Decode driver rows against `columns`.
    pub fn from_rows(columns: Vec<String>, rows: &[Row]) -> DynResult<Self> {
        let mut set = Self::new(columns);
        set.rows.reserve(rows.len());
        for row in rows {
            set.rows.push(record_from_row(&set.columns, row)?);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    pub fn into_first(self) -> Option<Record> {
        self.rows.into_iter().next()
    }

    /// Value of the first column of the first row (e.g. `COUNT(*)`).
    pub fn scalar(&self) -> Option<&Value> {
        self.first().and_then(|r| r.values().next())
    }

    /// JSON array of row objects.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(record_to_json).collect())
    }
}

fn record_from_row(columns: &[String], row: &Row) -> DynResult<Record> {
    let mut record = Record::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        record.insert(name.clone(), Value::from_column(row, idx)?);
    }
    Ok(record)
}

/// JSON object for one record, keeping column order.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Something that can run a [`Statement`].
pub trait RecordStore: Send + Sync {
    /// Run a row-returning statement.
    fn query(&self, statement: &Statement) -> impl Future<Output = DynResult<RecordSet>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, statement: &Statement) -> impl Future<Output = DynResult<u64>> + Send;

    /// First row of a row-returning statement.
    ///
    /// The default runs [`query`](Self::query) and keeps the first row;
    /// implementations that can stream should stop after one row instead.
    fn query_first(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = DynResult<Option<Record>>> + Send {
        let rows = self.query(statement);
        async move { Ok(rows.await?.into_first()) }
    }
}

impl RecordStore for tokio_postgres::Client {
    async fn query(&self, statement: &Statement) -> DynResult<RecordSet> {
        log_statement(statement);
        let started = Instant::now();
        let result = fetch(self, statement).await;
        log_outcome(statement, started, result.as_ref().map(|set| set.len() as u64));
        result
    }

    async fn execute(&self, statement: &Statement) -> DynResult<u64> {
        log_statement(statement);
        let started = Instant::now();
        let result = tokio_postgres::Client::execute(self, statement.sql(), &statement.params_ref())
            .await
            .map_err(DynError::from);
        log_outcome(statement, started, result.as_ref().copied());
        result
    }

    async fn query_first(&self, statement: &Statement) -> DynResult<Option<Record>> {
        log_statement(statement);
        let started = Instant::now();
        let result = fetch_first(self, statement).await;
        log_outcome(
            statement,
            started,
            result.as_ref().map(|record| u64::from(record.is_some())),
        );
        result
    }
}

async fn fetch(client: &tokio_postgres::Client, statement: &Statement) -> DynResult<RecordSet> {
    let prepared = client.prepare(statement.sql()).await?;
    let columns = prepared
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let rows = client.query(&prepared, &statement.params_ref()).await?;
    RecordSet::from_rows(columns, &rows)
}

/// Pull rows one at a time and drop the stream after the first.
async fn fetch_first(
    client: &tokio_postgres::Client,
    statement: &Statement,
) -> DynResult<Option<Record>> {
    let stream = client
        .query_raw(statement.sql(), statement.params_ref())
        .await?;
    let mut stream = std::pin::pin!(stream);
    let Some(row) = stream.try_next().await? else {
        return Ok(None);
    };
    let columns: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    record_from_row(&columns, &row).map(Some)
}

impl<S: RecordStore> RecordStore for &S {
    fn query(&self, statement: &Statement) -> impl Future<Output = DynResult<RecordSet>> + Send {
        (**self).query(statement)
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = DynResult<u64>> + Send {
        (**self).execute(statement)
    }

    fn query_first(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = DynResult<Option<Record>>> + Send {
        (**self).query_first(statement)
    }
}

impl<S: RecordStore> RecordStore for Arc<S> {
    fn query(&self, statement: &Statement) -> impl Future<Output = DynResult<RecordSet>> + Send {
        (**self).query(statement)
    }

    fn execute(&self, statement: &Statement) -> impl Future<Output = DynResult<u64>> + Send {
        (**self).execute(statement)
    }

    fn query_first(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = DynResult<Option<Record>>> + Send {
        (**self).query_first(statement)
    }
}

const MAX_LOGGED_SQL: usize = 200;

pub(crate) fn log_statement(statement: &Statement) {
    tracing::debug!(
        target: "pgdyn.sql",
        sql = %truncate_sql(statement.sql(), MAX_LOGGED_SQL),
        param_count = statement.param_count(),
        "executing"
    );
}

fn log_outcome(statement: &Statement, started: Instant, result: Result<u64, &DynError>) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(rows) => tracing::debug!(target: "pgdyn.sql", rows, elapsed_ms, "done"),
        Err(error) => tracing::error!(
            target: "pgdyn.sql",
            sql = %truncate_sql(statement.sql(), MAX_LOGGED_SQL),
            elapsed_ms,
            %error,
            "statement failed"
        ),
    }
}

/// Cut `sql` to at most `max` bytes on a char boundary, marking the cut.
pub(crate) fn truncate_sql(sql: &str, max: usize) -> String {
    if sql.len() <= max {
        return sql.to_string();
    }
    let mut end = max;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}
