//! Integration tests for the principal repository using in-memory
//! SurrealDB.

use keygate_core::error::KeygateError;
use keygate_core::models::principal::{CreatePrincipal, PrincipalKind};
use keygate_core::repository::PrincipalRepository;
use keygate_db::repository::SurrealPrincipalRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> SurrealPrincipalRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    keygate_db::run_migrations(&db).await.unwrap();
    SurrealPrincipalRepository::new(db)
}

fn user(name: &str, secret: &str) -> CreatePrincipal {
    CreatePrincipal {
        kind: PrincipalKind::User,
        name: name.into(),
        secret: secret.into(),
    }
}

#[tokio::test]
async fn create_assigns_monotonically_increasing_ids() {
    let repo = setup().await;

    let alice = repo.create(user("alice", "pw1")).await.unwrap();
    let bob = repo.create(user("bob", "pw2")).await.unwrap();

    assert!(alice.id >= 1);
    assert!(bob.id > alice.id);
    assert_eq!(alice.kind, PrincipalKind::User);
    assert_eq!(alice.name, "alice");
    assert_eq!(alice.secret, "pw1");
    assert!(alice.refresh_token.is_none());
}

#[tokio::test]
async fn duplicate_name_within_kind_is_rejected() {
    let repo = setup().await;

    repo.create(user("alice", "pw1")).await.unwrap();
    let err = repo.create(user("alice", "pw2")).await.unwrap_err();

    assert!(matches!(err, KeygateError::AlreadyExists { .. }));
}

#[tokio::test]
async fn same_name_across_kinds_is_allowed() {
    let repo = setup().await;

    repo.create(user("shared", "pw")).await.unwrap();
    let service = repo
        .create(CreatePrincipal {
            kind: PrincipalKind::Service,
            name: "shared".into(),
            secret: "secretX".into(),
        })
        .await
        .unwrap();

    assert_eq!(service.kind, PrincipalKind::Service);
}

#[tokio::test]
async fn lookup_by_id_and_name() {
    let repo = setup().await;

    let created = repo.create(user("alice", "pw1")).await.unwrap();

    let by_id = repo
        .get_by_id(PrincipalKind::User, created.id)
        .await
        .unwrap();
    assert_eq!(by_id.name, "alice");

    let by_name = repo
        .get_by_name(PrincipalKind::User, "alice")
        .await
        .unwrap();
    assert_eq!(by_name.id, created.id);

    // Same id under the wrong kind is not found.
    let err = repo
        .get_by_id(PrincipalKind::Service, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_lookups_return_not_found() {
    let repo = setup().await;

    let err = repo
        .get_by_name(PrincipalKind::User, "nobody")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));

    let err = repo.get_by_id(PrincipalKind::User, 999).await.unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));
}

#[tokio::test]
async fn set_refresh_token_overwrites_previous_value() {
    let repo = setup().await;
    let alice = repo.create(user("alice", "pw1")).await.unwrap();

    repo.set_refresh_token(PrincipalKind::User, alice.id, "token-1")
        .await
        .unwrap();
    let stored = repo
        .get_by_id(PrincipalKind::User, alice.id)
        .await
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-1"));

    repo.set_refresh_token(PrincipalKind::User, alice.id, "token-2")
        .await
        .unwrap();
    let stored = repo
        .get_by_id(PrincipalKind::User, alice.id)
        .await
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-2"));
}

#[tokio::test]
async fn set_refresh_token_for_missing_principal_fails() {
    let repo = setup().await;

    let err = repo
        .set_refresh_token(PrincipalKind::User, 42, "token")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));
}

#[tokio::test]
async fn rotate_refresh_token_swaps_only_on_match() {
    let repo = setup().await;
    let alice = repo.create(user("alice", "pw1")).await.unwrap();

    repo.set_refresh_token(PrincipalKind::User, alice.id, "token-1")
        .await
        .unwrap();

    repo.rotate_refresh_token(PrincipalKind::User, alice.id, "token-1", "token-2")
        .await
        .unwrap();
    let stored = repo
        .get_by_id(PrincipalKind::User, alice.id)
        .await
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-2"));

    // A rotation presenting the already-replaced value matches nothing
    // and leaves the slot untouched.
    let err = repo
        .rotate_refresh_token(PrincipalKind::User, alice.id, "token-1", "token-3")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));
    let stored = repo
        .get_by_id(PrincipalKind::User, alice.id)
        .await
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-2"));
}

#[tokio::test]
async fn rotate_refresh_token_for_missing_principal_fails() {
    let repo = setup().await;

    let err = repo
        .rotate_refresh_token(PrincipalKind::User, 42, "token-1", "token-2")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::NotFound { .. }));
}

#[tokio::test]
async fn clear_refresh_token_empties_the_slot() {
    let repo = setup().await;
    let alice = repo.create(user("alice", "pw1")).await.unwrap();

    repo.set_refresh_token(PrincipalKind::User, alice.id, "token-1")
        .await
        .unwrap();
    repo.clear_refresh_token(PrincipalKind::User, alice.id)
        .await
        .unwrap();

    let stored = repo
        .get_by_id(PrincipalKind::User, alice.id)
        .await
        .unwrap();
    assert!(stored.refresh_token.is_none());
}
