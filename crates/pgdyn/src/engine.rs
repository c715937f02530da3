//! Request execution: translate, run against a [`RecordStore`], shape the result.

use serde_json::json;

use crate::clause::{FilterSet, Operation, Payload, QueryRequest, ReadOptions};
use crate::error::{DynError, DynResult};
use crate::store::{Record, RecordSet, RecordStore, record_to_json};
use crate::translate;

/// Result of one executed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Count(i64),
    Found(Record),
    NotFound,
    Records(RecordSet),
    /// The inserted payload, echoed back.
    Created(Payload),
    Affected(u64),
}

impl Outcome {
    /// Response body for the outcome.
    ///
    /// | outcome     | body                                  |
    /// |-------------|---------------------------------------|
    /// | `Count`     | `{"count": n}`                        |
    /// | `Found`     | the record                            |
    /// | `NotFound`  | `null`                                |
    /// | `Records`   | array of records                      |
    /// | `Created`   | the payload                           |
    /// | `Affected`  | `{"message": "success", "affected": n}` |
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Outcome::Count(n) => json!({ "count": n }),
            Outcome::Found(record) => record_to_json(record),
            Outcome::NotFound => serde_json::Value::Null,
            Outcome::Records(set) => set.to_json(),
            Outcome::Created(payload) => payload.to_json(),
            Outcome::Affected(n) => json!({ "message": "success", "affected": n }),
        }
    }
}

/// Runs translated statements against a store.
///
/// Every method validates and translates first; a request that fails
/// validation never reaches the store.
#[derive(Debug, Clone)]
pub struct Engine<S> {
    store: S,
}

impl<S: RecordStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn count(&self, model: &str, filter: &FilterSet) -> DynResult<i64> {
        let statement = translate::count(model, filter)?;
        let set = self.store.query(&statement).await?;
        set.scalar()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| DynError::decode("count", "expected an integer count"))
    }

    /// First matching row, or `None`.
    pub async fn find_one(&self, model: &str, filter: &FilterSet) -> DynResult<Option<Record>> {
        let statement = translate::find_one(model, filter)?;
        self.store.query_first(&statement).await
    }

    pub async fn find_many(
        &self,
        model: &str,
        filter: &FilterSet,
        read: &ReadOptions,
    ) -> DynResult<RecordSet> {
        let statement = translate::find_many(model, filter, read)?;
        self.store.query(&statement).await
    }

    /// Insert one row; returns the affected-row count.
    pub async fn create(&self, model: &str, payload: &Payload) -> DynResult<u64> {
        let statement = translate::create(model, payload)?;
        self.store.execute(&statement).await
    }

    pub async fn update(&self, model: &str, payload: &Payload, filter: &FilterSet) -> DynResult<u64> {
        let statement = translate::update(model, payload, filter)?;
        self.store.execute(&statement).await
    }

    pub async fn update_many(
        &self,
        model: &str,
        payload: &Payload,
        filter: &FilterSet,
    ) -> DynResult<u64> {
        let statement = translate::update_many(model, payload, filter)?;
        self.store.execute(&statement).await
    }

    pub async fn delete(&self, model: &str, filter: &FilterSet) -> DynResult<u64> {
        let statement = translate::delete(model, filter)?;
        self.store.execute(&statement).await
    }

    pub async fn delete_many(&self, model: &str, filter: &FilterSet) -> DynResult<u64> {
        let statement = translate::delete_many(model, filter)?;
        self.store.execute(&statement).await
    }

    /// Execute `operation` for a decoded request.
    pub async fn run(&self, operation: Operation, request: &QueryRequest) -> DynResult<Outcome> {
        let model = request.model.as_str();
        let filter = &request.filter;
        let outcome = match operation {
            Operation::Count => Outcome::Count(self.count(model, filter).await?),
            Operation::FindOne => match self.find_one(model, filter).await? {
                Some(record) => Outcome::Found(record),
                None => Outcome::NotFound,
            },
            Operation::FindMany => {
                Outcome::Records(self.find_many(model, filter, &request.read).await?)
            }
            Operation::Create => {
                let payload = require_payload(request)?;
                self.create(model, payload).await?;
                Outcome::Created(payload.clone())
            }
            Operation::Update => {
                Outcome::Affected(self.update(model, require_payload(request)?, filter).await?)
            }
            Operation::UpdateMany => {
                let payload = require_payload(request)?;
                Outcome::Affected(self.update_many(model, payload, filter).await?)
            }
            Operation::Delete => Outcome::Affected(self.delete(model, filter).await?),
            Operation::DeleteMany => Outcome::Affected(self.delete_many(model, filter).await?),
        };
        tracing::debug!(target: "pgdyn.sql", %operation, model, "request handled");
        Ok(outcome)
    }
}

fn require_payload(request: &QueryRequest) -> DynResult<&Payload> {
    request
        .payload
        .as_ref()
        .ok_or_else(|| DynError::validation("empty payload"))
}
