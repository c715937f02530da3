use super::*;
use crate::clause::{Clause, Operation, QueryRequest};
use crate::value::Value;

fn id_and_active() -> FilterSet {
    serde_json::from_str(
        r#"[
            {"field": "id", "operator": "eq", "value": "42", "connector": ""},
            {"field": "active", "operator": "eq", "value": "true", "connector": "AND"}
        ]"#,
    )
    .unwrap()
}

fn texts(args: &[Value]) -> Vec<String> {
    args.iter().map(|v| v.to_string()).collect()
}

#[test]
fn find_many_with_two_clauses() {
    let q = find_many("users", &id_and_active(), &ReadOptions::default()).unwrap();
    assert_eq!(
        q.sql(),
        r#"SELECT * FROM "users" WHERE "id" = $1 AND "active" = $2"#
    );
    assert_eq!(texts(q.args()), vec!["42", "true"]);
}

#[test]
fn create_keeps_payload_order() {
    let payload = Payload::new().set("name", "a").set("age", "30");
    let q = create("users", &payload).unwrap();
    assert_eq!(
        q.sql(),
        r#"INSERT INTO "users" ("name", "age") VALUES ($1, $2)"#
    );
    assert_eq!(texts(q.args()), vec!["a", "30"]);
}

#[test]
fn update_numbers_set_before_where() {
    let payload = Payload::new().set("name", "b");
    let filter = FilterSet::new().with(Clause::eq("id", "1"));
    let q = update("users", &payload, &filter).unwrap();
    assert_eq!(q.sql(), r#"UPDATE users SET name = $1 WHERE "id" = $2"#);
    assert_eq!(texts(q.args()), vec!["b", "1"]);
}

#[test]
fn update_with_several_columns_and_clauses() {
    let payload = Payload::new().set("name", "b").set("email", "b@x.io");
    let filter = FilterSet::new()
        .with(Clause::eq("id", "1"))
        .with(Clause::or_eq("id", "2"));
    let q = update_many("users", &payload, &filter).unwrap();
    assert_eq!(
        q.sql(),
        r#"UPDATE users SET name = $1, email = $2 WHERE "id" = $3 OR "id" = $4"#
    );
    assert_eq!(texts(q.args()), vec!["b", "b@x.io", "1", "2"]);
}

#[test]
fn count_without_filter_has_no_where() {
    let q = count("users", &FilterSet::new()).unwrap();
    assert_eq!(q.sql(), r#"SELECT COUNT(*) FROM "users""#);
    assert!(q.args().is_empty());
}

#[test]
fn count_with_filter() {
    let q = count("session", &FilterSet::new().with(Clause::eq("userId", "u1"))).unwrap();
    assert_eq!(q.sql(), r#"SELECT COUNT(*) FROM "session" WHERE "userId" = $1"#);
}

#[test]
fn empty_filter_never_emits_where_for_reads() {
    for q in [
        count("users", &FilterSet::new()).unwrap(),
        find_many("users", &FilterSet::new(), &ReadOptions::default()).unwrap(),
    ] {
        assert!(!q.sql().contains("WHERE"), "{}", q.sql());
    }
}

#[test]
fn find_one_requires_where() {
    let err = find_one("users", &FilterSet::new()).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Validation error: where required");
}

#[test]
fn find_one_matches_find_many_shape() {
    let one = find_one("users", &id_and_active()).unwrap();
    let many = find_many("users", &id_and_active(), &ReadOptions::default()).unwrap();
    assert_eq!(one, many);
}

#[test]
fn find_one_ignores_read_options() {
    let req = QueryRequest::new("users")
        .filter(Clause::eq("id", "1"))
        .limit(5)
        .sort_by("name");
    let q = translate(Operation::FindOne, &req).unwrap();
    assert_eq!(q.sql(), r#"SELECT * FROM "users" WHERE "id" = $1"#);
}

#[test]
fn empty_payload_is_rejected_for_writes() {
    let filter = FilterSet::new().with(Clause::eq("id", "1"));
    for result in [
        create("users", &Payload::new()),
        update("users", &Payload::new(), &filter),
        update_many("users", &Payload::new(), &filter),
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: empty payload");
    }
}

#[test]
fn missing_payload_is_rejected_by_translate() {
    let req = QueryRequest::new("users").filter(Clause::eq("id", "1"));
    for op in [Operation::Create, Operation::Update, Operation::UpdateMany] {
        assert!(translate(op, &req).unwrap_err().is_validation());
    }
}

#[test]
fn unconditional_update_and_delete_are_rejected() {
    let payload = Payload::new().set("name", "b");
    assert!(update("users", &payload, &FilterSet::new()).is_err());
    assert!(delete("users", &FilterSet::new()).is_err());
    assert!(delete_many("users", &FilterSet::new()).is_err());
}

#[test]
fn delete_and_delete_many_are_the_same_statement() {
    let filter = FilterSet::new().with(Clause::eq("token", "abc"));
    let one = delete("session", &filter).unwrap();
    let many = delete_many("session", &filter).unwrap();
    assert_eq!(one.sql(), r#"DELETE FROM "session" WHERE "token" = $1"#);
    assert_eq!(one, many);
}

#[test]
fn unknown_operator_still_renders_equality() {
    let filter = FilterSet::new().with(Clause::eq("age", 3).with_operator("gt"));
    let q = find_many("users", &filter, &ReadOptions::default()).unwrap();
    assert_eq!(q.sql(), r#"SELECT * FROM "users" WHERE "age" = $1"#);
}

#[test]
fn first_clause_connector_is_ignored() {
    let filter: FilterSet = serde_json::from_str(
        r#"[
            {"field": "id", "operator": null, "value": "1", "connector": "NOT"},
            {"field": "active", "value": "true", "connector": null}
        ]"#,
    )
    .unwrap();
    let q = find_many("users", &filter, &ReadOptions::default()).unwrap();
    assert_eq!(
        q.sql(),
        r#"SELECT * FROM "users" WHERE "id" = $1 AND "active" = $2"#
    );
}

#[test]
fn unknown_connector_after_first_clause_is_rejected() {
    let filter: FilterSet = serde_json::from_str(
        r#"[
            {"field": "id", "value": "1"},
            {"field": "id", "value": "2", "connector": "XOR"}
        ]"#,
    )
    .unwrap();
    let err = find_many("users", &filter, &ReadOptions::default()).unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(err.to_string().contains("XOR"), "{err}");
}

#[test]
fn identifiers_are_quoted_not_escaped() {
    let filter = FilterSet::new().with(Clause::eq(r#"id" = "id" OR "1"#, "x"));
    let q = find_many("users", &filter, &ReadOptions::default()).unwrap();
    assert_eq!(
        q.sql(),
        r#"SELECT * FROM "users" WHERE "id" = "id" OR "1" = $1"#
    );
}

#[test]
fn read_options_render_as_literals() {
    let read = ReadOptions {
        limit: Some(10),
        offset: Some(20),
        sort_by: vec!["-createdAt".into(), "name".into()],
    };
    let q = find_many("users", &FilterSet::new().with(Clause::eq("a", 1)), &read).unwrap();
    assert_eq!(
        q.sql(),
        r#"SELECT * FROM "users" WHERE "a" = $1 ORDER BY "createdAt" DESC, "name" ASC LIMIT 10 OFFSET 20"#
    );
    assert_eq!(q.param_count(), 1);
}

#[test]
fn zero_limit_and_offset_are_unset() {
    let read = ReadOptions {
        limit: Some(0),
        offset: Some(0),
        sort_by: Vec::new(),
    };
    let q = find_many("users", &FilterSet::new(), &read).unwrap();
    assert_eq!(q.sql(), r#"SELECT * FROM "users""#);
}

#[test]
fn bad_sort_direction_is_a_validation_error() {
    let req = QueryRequest::new("users").sort_by("name:up");
    assert!(translate(Operation::FindMany, &req).unwrap_err().is_validation());
}

#[test]
fn empty_model_and_field_are_rejected() {
    assert!(count("", &FilterSet::new()).is_err());
    assert!(count("users", &FilterSet::new().with(Clause::eq("", 1))).is_err());
    assert!(create("users", &Payload::new().set("", 1)).is_err());
}

#[test]
fn placeholder_count_matches_clause_count() {
    for n in 1..=25 {
        let filter: FilterSet = (0..n)
            .map(|i| {
                if i % 3 == 0 {
                    Clause::or_eq(format!("c{i}"), i)
                } else {
                    Clause::eq(format!("c{i}"), i)
                }
            })
            .collect();

        for op in [
            Operation::Count,
            Operation::FindOne,
            Operation::FindMany,
            Operation::Delete,
            Operation::DeleteMany,
        ] {
            let req = QueryRequest {
                model: "t".into(),
                filter: filter.clone(),
                ..QueryRequest::default()
            };
            let q = translate(op, &req).unwrap();
            assert_eq!(q.args().len(), n as usize);
            assert_eq!(q.sql().matches('$').count(), n as usize, "{op}: {}", q.sql());
            assert!(q.sql().ends_with(&format!("${n}")));
        }
    }
}

#[test]
fn update_placeholders_are_strictly_increasing() {
    let payload: Payload = (0..4).map(|i| (format!("s{i}"), i)).collect();
    let filter: FilterSet = (0..3).map(|i| Clause::eq(format!("w{i}"), i)).collect();
    let q = update("t", &payload, &filter).unwrap();

    let numbers: Vec<usize> = q
        .sql()
        .split('$')
        .skip(1)
        .map(|s| {
            s.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse()
                .unwrap()
        })
        .collect();
    assert_eq!(numbers, (1..=7).collect::<Vec<_>>());
}
