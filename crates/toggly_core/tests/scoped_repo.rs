use std::sync::atomic::{AtomicUsize, Ordering};
use toggly_core::{
    Document, DocumentStore, EntityKind, Environment, Filter, Group, Project, ProjectStatus,
    RepoError, Scope, ScopedRepository, SqliteDocumentStore, StoreResult,
};

/// Counts backend calls that reach the wrapped store.
struct CountingStore {
    inner: SqliteDocumentStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SqliteDocumentStore::in_memory().unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for CountingStore {
    fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.hit();
        self.inner.find(collection, filter)
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.hit();
        self.inner.find_one(collection, filter)
    }

    fn insert_one(&self, collection: &str, document: &Document) -> StoreResult<()> {
        self.hit();
        self.inner.insert_one(collection, document)
    }

    fn find_one_and_replace(
        &self,
        collection: &str,
        filter: &Filter,
        replacement: &Document,
    ) -> StoreResult<bool> {
        self.hit();
        self.inner.find_one_and_replace(collection, filter, replacement)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.hit();
        self.inner.delete_one(collection, filter)
    }

    fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> StoreResult<()> {
        self.hit();
        self.inner.ensure_unique_index(collection, fields)
    }
}

fn project(owner: &str, code: &str) -> Project {
    Project {
        code: code.to_string(),
        owner: owner.to_string(),
        status: ProjectStatus::Active,
        description: String::new(),
        reg_date: 1_700_000_000_000,
    }
}

fn environment(owner: &str, project: &str, code: &str) -> Environment {
    Environment {
        code: code.to_string(),
        owner: owner.to_string(),
        project: project.to_string(),
        description: String::new(),
        protected: false,
        reg_date: 1_700_000_000_000,
    }
}

fn repo() -> ScopedRepository<SqliteDocumentStore> {
    ScopedRepository::new(SqliteDocumentStore::in_memory().unwrap())
}

#[test]
fn save_then_get_roundtrip() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    repo.save(&scope, &project("ow1", "proj1")).unwrap();

    let loaded: Project = repo.get(&scope, "proj1").unwrap();
    assert_eq!(loaded, project("ow1", "proj1"));
}

#[test]
fn owners_are_isolated() {
    let repo = repo();
    repo.save(&Scope::for_owner("ow1"), &project("ow1", "proj1"))
        .unwrap();
    repo.save(&Scope::for_owner("ow2"), &project("ow2", "proj1"))
        .unwrap();

    let ow1 = repo.list::<Project>(&Scope::for_owner("ow1")).unwrap();
    let ow3 = repo.list::<Project>(&Scope::for_owner("ow3")).unwrap();
    assert_eq!(ow1.len(), 1);
    assert_eq!(ow1[0].owner, "ow1");
    assert!(ow3.is_empty());
}

#[test]
fn duplicate_save_reports_scoped_key() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    repo.save(&scope, &project("ow1", "proj1")).unwrap();

    let err = repo.save(&scope, &project("ow1", "proj1")).unwrap_err();
    match err {
        RepoError::UniqueIndex { kind, key } => {
            assert_eq!(kind, EntityKind::Project);
            assert_eq!(key, "owner: ow1, project: proj1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.list::<Project>(&scope).unwrap().len(), 1);
}

#[test]
fn same_code_under_different_projects_is_allowed() {
    let repo = repo();
    let p1 = Scope::for_owner("ow1").with_project("p1");
    let p2 = Scope::for_owner("ow1").with_project("p2");
    repo.save(&p1, &environment("ow1", "p1", "dev")).unwrap();
    repo.save(&p2, &environment("ow1", "p2", "dev")).unwrap();

    assert_eq!(repo.list::<Environment>(&p1).unwrap().len(), 1);
    assert_eq!(repo.list::<Environment>(&p2).unwrap().len(), 1);
}

#[test]
fn get_missing_record_is_not_found_with_key() {
    let repo = repo();
    let scope = Scope::for_owner("ow1").with_project("p1");

    let err = repo.get::<Environment>(&scope, "prod").unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { kind: EntityKind::Environment, ref key }
            if key == "owner: ow1, project: p1, env: prod"
    ));
}

#[test]
fn relation_mismatch_never_reaches_the_backend() {
    let store = CountingStore::new();
    let repo = ScopedRepository::new(&store);
    let scope = Scope::for_owner("ow1").with_project("p1");

    let err = repo
        .save(&scope, &environment("ow1", "other", "dev"))
        .unwrap_err();
    match err {
        RepoError::RelationBroken(relation) => {
            assert_eq!(relation.field, "project");
            assert_eq!(relation.expected, "p1");
            assert_eq!(relation.actual, "other");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = repo
        .save(&scope, &environment("ow2", "p1", "dev"))
        .unwrap_err();
    match err {
        RepoError::RelationBroken(relation) => {
            assert_eq!(relation.field, "owner");
            assert_eq!(relation.expected, "ow1");
            assert_eq!(relation.actual, "ow2");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = repo
        .update(&scope, &environment("ow2", "p1", "dev"))
        .unwrap_err();
    assert!(matches!(err, RepoError::RelationBroken(ref relation) if relation.field == "owner"));
    assert_eq!(store.calls(), 0);
}

#[test]
fn incomplete_scope_never_reaches_the_backend() {
    let store = CountingStore::new();
    let repo = ScopedRepository::new(&store);
    let scope = Scope::for_owner("ow1").with_project("p1");

    let err = repo.list::<Group>(&scope).unwrap_err();
    assert!(matches!(
        err,
        RepoError::ScopeIncomplete(ref scope_err) if scope_err.missing == "environment"
    ));

    let err = repo
        .get::<Environment>(&Scope::for_owner("ow1").with_project(""), "dev")
        .unwrap_err();
    assert!(matches!(err, RepoError::ScopeIncomplete(_)));
    assert_eq!(store.calls(), 0);
}

#[test]
fn update_replaces_existing_and_rejects_missing() {
    let repo = repo();
    let scope = Scope::for_owner("ow1").with_project("p1");
    repo.save(&scope, &environment("ow1", "p1", "dev")).unwrap();

    let mut changed = environment("ow1", "p1", "dev");
    changed.protected = true;
    changed.description = "shared".to_string();
    repo.update(&scope, &changed).unwrap();
    assert_eq!(repo.get::<Environment>(&scope, "dev").unwrap(), changed);

    let err = repo
        .update(&scope, &environment("ow1", "p1", "prod"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn delete_is_idempotent() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    repo.save(&scope, &project("ow1", "proj1")).unwrap();

    assert!(repo.delete::<Project>(&scope, "proj1").unwrap());
    assert!(!repo.delete::<Project>(&scope, "proj1").unwrap());
    assert!(matches!(
        repo.get::<Project>(&scope, "proj1").unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn deleted_code_can_be_reused() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    repo.save(&scope, &project("ow1", "proj1")).unwrap();
    repo.delete::<Project>(&scope, "proj1").unwrap();
    repo.save(&scope, &project("ow1", "proj1")).unwrap();
}

#[test]
fn get_batch_skips_unknown_codes() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    for code in ["a", "b", "c"] {
        repo.save(&scope, &project("ow1", code)).unwrap();
    }
    repo.save(&Scope::for_owner("ow2"), &project("ow2", "b"))
        .unwrap();

    let found = repo
        .get_batch::<Project>(&scope, &["c", "b", "missing"])
        .unwrap();
    let codes = found.iter().map(|p| p.code.as_str()).collect::<Vec<_>>();
    assert_eq!(codes, vec!["b", "c"]);
    assert!(found.iter().all(|p| p.owner == "ow1"));

    assert!(repo.get_batch::<Project>(&scope, &[]).unwrap().is_empty());
}

#[test]
fn list_preserves_insertion_order() {
    let repo = repo();
    let scope = Scope::for_owner("ow1");
    for code in ["zeta", "alpha", "mid"] {
        repo.save(&scope, &project("ow1", code)).unwrap();
    }
    let codes = repo
        .list::<Project>(&scope)
        .unwrap()
        .into_iter()
        .map(|p| p.code)
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["zeta", "alpha", "mid"]);
}
