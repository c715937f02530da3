use std::sync::Mutex;

use pgdyn::{
    Clause, DynError, DynResult, Engine, FilterSet, Operation, Outcome, Payload, QueryRequest,
    Record, RecordSet, RecordStore, SchemaRegistry, Statement, Value,
};

/// In-memory store: records every statement and answers with canned data.
#[derive(Default)]
struct RecordingStore {
    seen: Mutex<Vec<Statement>>,
    rows: Mutex<Option<RecordSet>>,
    affected: u64,
}

impl RecordingStore {
    fn returning(rows: RecordSet) -> Self {
        Self {
            rows: Mutex::new(Some(rows)),
            ..Self::default()
        }
    }

    fn affecting(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<Statement> {
        self.seen.lock().unwrap().clone()
    }
}

impl RecordStore for RecordingStore {
    async fn query(&self, statement: &Statement) -> DynResult<RecordSet> {
        self.seen.lock().unwrap().push(statement.clone());
        Ok(self.rows.lock().unwrap().clone().unwrap_or_default())
    }

    async fn execute(&self, statement: &Statement) -> DynResult<u64> {
        self.seen.lock().unwrap().push(statement.clone());
        Ok(self.affected)
    }
}

fn users(rows: &[(&str, &str)]) -> RecordSet {
    let mut set = RecordSet::new(vec!["id".into(), "name".into()]);
    for (id, name) in rows {
        set.push_row([Value::from(*id), Value::from(*name)]);
    }
    set
}

fn by_id(id: &str) -> FilterSet {
    FilterSet::new().with(Clause::eq("id", id))
}

#[tokio::test]
async fn find_one_with_empty_filter_never_reaches_the_store() {
    let engine = Engine::new(RecordingStore::returning(users(&[("1", "a")])));
    let err = engine.find_one("user", &FilterSet::new()).await.unwrap_err();
    assert!(err.is_validation());
    assert!(engine.store().seen().is_empty());
}

#[tokio::test]
async fn writes_without_filter_never_reach_the_store() {
    let engine = Engine::new(RecordingStore::affecting(5));
    let payload = Payload::new().set("name", "x");

    assert!(engine.update("user", &payload, &FilterSet::new()).await.is_err());
    assert!(engine.update_many("user", &payload, &FilterSet::new()).await.is_err());
    assert!(engine.delete("user", &FilterSet::new()).await.is_err());
    assert!(engine.delete_many("user", &FilterSet::new()).await.is_err());
    assert!(engine.create("user", &Payload::new()).await.is_err());
    assert!(engine.store().seen().is_empty());
}

#[tokio::test]
async fn find_one_returns_first_row() {
    let engine = Engine::new(RecordingStore::returning(users(&[("1", "a"), ("2", "b")])));
    let record = engine.find_one("user", &by_id("1")).await.unwrap().unwrap();
    assert_eq!(record["name"], Value::from("a"));

    let seen = engine.store().seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].sql(), r#"SELECT * FROM "user" WHERE "id" = $1"#);
}

/// Streams a single row; a full `query` is a failure.
struct SingleRowStore;

impl RecordStore for SingleRowStore {
    async fn query(&self, _: &Statement) -> DynResult<RecordSet> {
        Err(DynError::connection("full result set requested"))
    }

    async fn execute(&self, _: &Statement) -> DynResult<u64> {
        Ok(0)
    }

    async fn query_first(&self, _: &Statement) -> DynResult<Option<Record>> {
        Ok(users(&[("1", "a")]).into_first())
    }
}

#[tokio::test]
async fn find_one_fetches_only_the_first_row() {
    let engine = Engine::new(SingleRowStore);
    let record = engine.find_one("user", &by_id("1")).await.unwrap().unwrap();
    assert_eq!(record["id"], Value::from("1"));

    let req = QueryRequest::new("user").filter(Clause::eq("id", "1"));
    let outcome = engine.run(Operation::FindOne, &req).await.unwrap();
    assert!(matches!(outcome, Outcome::Found(_)));
}

#[tokio::test]
async fn find_one_without_rows_is_not_found() {
    let engine = Engine::new(RecordingStore::returning(users(&[])));
    let req = QueryRequest::new("user").filter(Clause::eq("id", "404"));
    let outcome = engine.run(Operation::FindOne, &req).await.unwrap();
    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(outcome.to_json(), serde_json::Value::Null);
}

#[tokio::test]
async fn find_many_keeps_column_names_for_empty_results() {
    let engine = Engine::new(RecordingStore::returning(users(&[])));
    let set = engine
        .find_many("user", &FilterSet::new(), &Default::default())
        .await
        .unwrap();
    assert!(set.is_empty());
    assert_eq!(set.columns, vec!["id".to_string(), "name".to_string()]);
}

#[tokio::test]
async fn count_reads_the_scalar() {
    let mut set = RecordSet::new(vec!["count".into()]);
    set.push_row([Value::Int(7)]);
    let engine = Engine::new(RecordingStore::returning(set));

    let outcome = engine
        .run(Operation::Count, &QueryRequest::new("session"))
        .await
        .unwrap();
    assert_eq!(outcome.to_json(), serde_json::json!({"count": 7}));
    assert_eq!(
        engine.store().seen()[0].sql(),
        r#"SELECT COUNT(*) FROM "session""#
    );
}

#[tokio::test]
async fn count_without_a_row_is_a_decode_error() {
    let engine = Engine::new(RecordingStore::returning(RecordSet::new(vec!["count".into()])));
    let err = engine.count("session", &FilterSet::new()).await.unwrap_err();
    assert!(matches!(err, DynError::Decode { .. }));
}

#[tokio::test]
async fn run_decoded_create_request() {
    let req: QueryRequest = serde_json::from_str(
        r#"{"model": "user", "data": {"id": "u1", "name": "Ada", "emailVerified": true}}"#,
    )
    .unwrap();
    let engine = Engine::new(RecordingStore::affecting(1));
    let outcome = engine.run(Operation::Create, &req).await.unwrap();

    assert_eq!(
        outcome.to_json(),
        serde_json::json!({"id": "u1", "name": "Ada", "emailVerified": true})
    );
    let seen = engine.store().seen();
    assert_eq!(
        seen[0].sql(),
        r#"INSERT INTO "user" ("id", "name", "emailVerified") VALUES ($1, $2, $3)"#
    );
    assert_eq!(seen[0].args()[2], Value::Bool(true));
}

#[tokio::test]
async fn run_update_reports_affected_rows() {
    let req: QueryRequest = serde_json::from_str(
        r#"{"model": "user", "where": [{"field": "id", "value": "u1"}], "update": {"name": "B"}}"#,
    )
    .unwrap();
    let engine = Engine::new(RecordingStore::affecting(1));
    let outcome = engine.run(Operation::Update, &req).await.unwrap();
    assert_eq!(
        outcome.to_json(),
        serde_json::json!({"message": "success", "affected": 1})
    );
    assert_eq!(
        engine.store().seen()[0].sql(),
        r#"UPDATE user SET name = $1 WHERE "id" = $2"#
    );
}

#[tokio::test]
async fn run_create_without_payload_is_rejected() {
    let engine = Engine::new(RecordingStore::affecting(1));
    let err = engine
        .run(Operation::Create, &QueryRequest::new("user"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation error: empty payload");
    assert!(engine.store().seen().is_empty());
}

#[tokio::test]
async fn engine_accepts_a_borrowed_store() {
    let store = RecordingStore::affecting(2);
    let engine = Engine::new(&store);
    assert_eq!(engine.delete("session", &by_id("s1")).await.unwrap(), 2);
    assert_eq!(store.seen().len(), 1);
}

#[tokio::test]
async fn schema_apply_executes_in_registration_order() {
    use pgdyn::{FieldSpec, TableDescriptor};

    let mut registry = SchemaRegistry::new();
    registry
        .register_descriptor(
            TableDescriptor::record("User")
                .field(FieldSpec::column("id", "id", "String").primary_key()),
        )
        .register_descriptor(
            TableDescriptor::record("Session")
                .field(FieldSpec::column("id", "id", "String").primary_key()),
        );

    let store = RecordingStore::default();
    assert_eq!(registry.apply(&store).await.unwrap(), 2);
    let seen: Vec<String> = store.seen().iter().map(|s| s.sql().to_string()).collect();
    assert_eq!(
        seen,
        vec![
            r#"CREATE TABLE IF NOT EXISTS "user" ("id" TEXT, PRIMARY KEY ("id"));"#,
            r#"CREATE TABLE IF NOT EXISTS "session" ("id" TEXT, PRIMARY KEY ("id"));"#,
        ]
    );
}

#[tokio::test]
async fn schema_apply_stops_before_executing_invalid_entities() {
    use pgdyn::TableDescriptor;

    let mut registry = SchemaRegistry::new();
    registry.register_descriptor(TableDescriptor::scalar("Status"));

    let store = RecordingStore::default();
    assert!(registry.apply(&store).await.is_err());
    assert!(store.seen().is_empty());
}
