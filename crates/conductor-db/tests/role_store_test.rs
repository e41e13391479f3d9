//! Integration tests for the SurrealDB role store.

use conductor_core::access::PermissionChecker;
use conductor_core::models::identity::Identity;
use conductor_core::models::permission::Permission;
use conductor_core::models::role::Role;
use conductor_db::repository::SurrealRoleStore;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealRoleStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    conductor_db::run_migrations(&db).await.unwrap();
    SurrealRoleStore::new(db)
}

fn op_role() -> Role {
    Role {
        name: "Op".into(),
        permissions: vec![
            Permission::new("can_trigger", "Airflow"),
            Permission::new("can_dag_edit", "all_dags"),
        ],
    }
}

#[tokio::test]
async fn defined_role_grants_its_permissions() {
    let store = setup().await;
    store.define_role(&op_role()).await.unwrap();

    let alice = Identity::new("alice", vec!["Op".into()]);
    assert!(
        store
            .has_access(&alice, &Permission::new("can_trigger", "Airflow"))
            .await
    );
    assert!(
        !store
            .has_access(&alice, &Permission::new("can_delete", "Airflow"))
            .await
    );
}

#[tokio::test]
async fn identity_without_roles_is_denied() {
    let store = setup().await;
    store.define_role(&op_role()).await.unwrap();

    let nobody = Identity::new("nobody", vec![]);
    assert!(
        !store
            .has_access(&nobody, &Permission::new("can_trigger", "Airflow"))
            .await
    );
}

#[tokio::test]
async fn find_role_returns_grants() {
    let store = setup().await;
    store.define_role(&op_role()).await.unwrap();

    let role = store.find_role("Op").await.unwrap();
    assert_eq!(role.name, "Op");
    assert_eq!(role.permissions.len(), 2);
    assert!(role.grants(&Permission::new("can_dag_edit", "all_dags")));
}

#[tokio::test]
async fn find_unknown_role_fails() {
    let store = setup().await;
    assert!(store.find_role("Ghost").await.is_err());
}

#[tokio::test]
async fn redefining_role_replaces_grants() {
    let store = setup().await;
    store.define_role(&op_role()).await.unwrap();

    store
        .define_role(&Role {
            name: "Op".into(),
            permissions: vec![Permission::new("can_delete", "Airflow")],
        })
        .await
        .unwrap();

    let alice = Identity::new("alice", vec!["Op".into()]);
    assert!(
        !store
            .has_access(&alice, &Permission::new("can_trigger", "Airflow"))
            .await,
        "revoked grant must not be observed"
    );
    assert!(
        store
            .has_access(&alice, &Permission::new("can_delete", "Airflow"))
            .await
    );
}

#[tokio::test]
async fn redefining_with_repeated_grants_keeps_each_once() {
    let store = setup().await;
    store
        .define_role(&Role {
            name: "Op".into(),
            permissions: vec![
                Permission::new("can_trigger", "Airflow"),
                Permission::new("can_delete", "Airflow"),
            ],
        })
        .await
        .unwrap();

    store
        .define_role(&Role {
            name: "Op".into(),
            permissions: vec![
                Permission::new("can_paused", "Airflow"),
                Permission::new("can_paused", "Airflow"),
                Permission::new("can_trigger", "Airflow"),
            ],
        })
        .await
        .unwrap();

    let role = store.find_role("Op").await.unwrap();
    assert_eq!(
        role.permissions,
        vec![
            Permission::new("can_paused", "Airflow"),
            Permission::new("can_trigger", "Airflow"),
        ]
    );
}

#[tokio::test]
async fn role_can_be_defined_without_grants() {
    let store = setup().await;
    store.define_role(&op_role()).await.unwrap();

    store
        .define_role(&Role {
            name: "Op".into(),
            permissions: vec![],
        })
        .await
        .unwrap();

    let role = store.find_role("Op").await.unwrap();
    assert!(role.permissions.is_empty());
}
