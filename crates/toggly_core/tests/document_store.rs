use serde_json::json;
use toggly_core::db::DbError;
use toggly_core::{Document, DocumentStore, Filter, SqliteDocumentStore, StoreConfig, StoreError};

fn doc(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn codes(documents: &[Document]) -> Vec<&str> {
    documents
        .iter()
        .map(|document| document["code"].as_str().unwrap())
        .collect()
}

#[test]
fn find_returns_matches_in_insertion_order() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    for code in ["b", "a", "c"] {
        store
            .insert_one("project", &doc(json!({"owner": "ow1", "code": code})))
            .unwrap();
    }
    store
        .insert_one("project", &doc(json!({"owner": "ow2", "code": "z"})))
        .unwrap();

    let found = store
        .find("project", &Filter::new().eq("owner", "ow1"))
        .unwrap();
    assert_eq!(codes(&found), vec!["b", "a", "c"]);
}

#[test]
fn collections_do_not_see_each_other() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    store
        .insert_one("project", &doc(json!({"owner": "ow1", "code": "x"})))
        .unwrap();

    let filter = Filter::new().eq("owner", "ow1");
    assert!(store.find("environment", &filter).unwrap().is_empty());
    assert!(store.find_one("environment", &filter).unwrap().is_none());
}

#[test]
fn any_of_matches_listed_values_and_empty_set_matches_nothing() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    for code in ["a", "b", "c"] {
        store
            .insert_one("parameter", &doc(json!({"owner": "ow1", "code": code})))
            .unwrap();
    }

    let found = store
        .find(
            "parameter",
            &Filter::new().eq("owner", "ow1").any_of("code", ["c", "a", "nope"]),
        )
        .unwrap();
    assert_eq!(codes(&found), vec!["a", "c"]);

    let none = store
        .find(
            "parameter",
            &Filter::new().any_of("code", Vec::<String>::new()),
        )
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn unique_index_rejects_duplicate_scoped_key() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    store
        .ensure_unique_index("project", &["owner", "code"])
        .unwrap();
    store
        .ensure_unique_index("project", &["owner", "code"])
        .unwrap();

    store
        .insert_one("project", &doc(json!({"owner": "ow1", "code": "p"})))
        .unwrap();
    store
        .insert_one("project", &doc(json!({"owner": "ow2", "code": "p"})))
        .unwrap();

    let err = store
        .insert_one("project", &doc(json!({"owner": "ow1", "code": "p"})))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { ref collection } if collection == "project"));
}

#[test]
fn unique_index_is_scoped_to_its_collection() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    store
        .ensure_unique_index("project", &["owner", "code"])
        .unwrap();

    store
        .insert_one("group", &doc(json!({"owner": "ow1", "code": "p"})))
        .unwrap();
    store
        .insert_one("group", &doc(json!({"owner": "ow1", "code": "p"})))
        .unwrap();
    store
        .insert_one("project", &doc(json!({"owner": "ow1", "code": "p"})))
        .unwrap();
}

#[test]
fn find_one_and_replace_reports_whether_a_match_existed() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    store
        .insert_one(
            "environment",
            &doc(json!({"owner": "ow1", "project": "p", "code": "dev", "protected": false})),
        )
        .unwrap();

    let filter = Filter::new().eq("owner", "ow1").eq("code", "dev");
    let replacement = doc(json!({"owner": "ow1", "project": "p", "code": "dev", "protected": true}));
    assert!(store
        .find_one_and_replace("environment", &filter, &replacement)
        .unwrap());

    let loaded = store.find_one("environment", &filter).unwrap().unwrap();
    assert_eq!(loaded["protected"], json!(true));

    let missing = Filter::new().eq("owner", "ow1").eq("code", "prod");
    assert!(!store
        .find_one_and_replace("environment", &missing, &replacement)
        .unwrap());
}

#[test]
fn delete_one_removes_a_single_match() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    for _ in 0..2 {
        store
            .insert_one("group", &doc(json!({"owner": "ow1", "code": "g"})))
            .unwrap();
    }

    let filter = Filter::new().eq("code", "g");
    assert_eq!(store.delete_one("group", &filter).unwrap(), 1);
    assert_eq!(store.find("group", &filter).unwrap().len(), 1);
    assert_eq!(store.delete_one("group", &filter).unwrap(), 1);
    assert_eq!(store.delete_one("group", &filter).unwrap(), 0);
}

#[test]
fn unsafe_field_names_are_rejected_before_sql() {
    let store = SqliteDocumentStore::in_memory().unwrap();
    let err = store
        .find("project", &Filter::new().eq("code') OR 1=1 --", "x"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField(_)));

    let err = store
        .ensure_unique_index("project; DROP TABLE documents", &["code"])
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField(_)));
}

#[test]
fn file_store_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("toggly.db"));

    {
        let store = SqliteDocumentStore::open(&config).unwrap();
        store
            .insert_one("project", &doc(json!({"owner": "ow1", "code": "p"})))
            .unwrap();
    }

    let store = SqliteDocumentStore::open(&config).unwrap();
    let found = store
        .find("project", &Filter::new().eq("owner", "ow1"))
        .unwrap();
    assert_eq!(codes(&found), vec!["p"]);
}

#[test]
fn zero_deadline_config_is_rejected() {
    let config = StoreConfig {
        path: None,
        op_deadline_ms: 0,
    };
    let err = SqliteDocumentStore::open(&config).err().unwrap();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn newer_schema_surfaces_as_db_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = SqliteDocumentStore::open(&StoreConfig::file(&path)).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Db(DbError::UnsupportedSchemaVersion { db_version: 999, .. })
    ));
}
