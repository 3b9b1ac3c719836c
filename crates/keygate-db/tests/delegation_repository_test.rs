//! Integration tests for the delegation repository using in-memory
//! SurrealDB.

use keygate_core::error::KeygateError;
use keygate_core::models::delegation::CreateDelegationRelation;
use keygate_core::repository::DelegationRepository;
use keygate_db::repository::SurrealDelegationRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> SurrealDelegationRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    keygate_db::run_migrations(&db).await.unwrap();
    SurrealDelegationRepository::new(db)
}

fn relation(service_id: u64, user_id: u64, service_username: &str) -> CreateDelegationRelation {
    CreateDelegationRelation {
        service_id,
        user_id,
        service_username: service_username.into(),
    }
}

#[tokio::test]
async fn link_then_find_exact_triple() {
    let repo = setup().await;

    let created = repo.link(relation(1, 2, "alice-at-svc")).await.unwrap();
    assert_eq!(created.service_id, 1);
    assert_eq!(created.user_id, 2);
    assert_eq!(created.service_username, "alice-at-svc");

    let found = repo.find(1, 2, "alice-at-svc").await.unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
async fn any_mismatched_field_is_not_found() {
    let repo = setup().await;
    repo.link(relation(1, 2, "alice-at-svc")).await.unwrap();

    let wrong_service = repo.find(9, 2, "alice-at-svc").await.unwrap_err();
    assert!(matches!(wrong_service, KeygateError::NotFound { .. }));

    let wrong_user = repo.find(1, 9, "alice-at-svc").await.unwrap_err();
    assert!(matches!(wrong_user, KeygateError::NotFound { .. }));

    let wrong_username = repo.find(1, 2, "bob-at-svc").await.unwrap_err();
    assert!(matches!(wrong_username, KeygateError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_link_is_rejected() {
    let repo = setup().await;
    repo.link(relation(1, 2, "alice-at-svc")).await.unwrap();

    let err = repo.link(relation(1, 2, "alice-at-svc")).await.unwrap_err();
    assert!(matches!(err, KeygateError::AlreadyExists { .. }));

    // A different username for the same pair is a distinct relation.
    repo.link(relation(1, 2, "alice-alt")).await.unwrap();
}
