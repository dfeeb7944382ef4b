//! End-to-end tests for `SQLite` repositories.
//!
//! These tests use an in-memory `SQLite` database.
//! Run with: `cargo test --features sqlx_sqlite --test e2e_sqlite`

#![cfg(feature = "sqlx_sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use enclave_tenancy::sqlite::{
    SqliteGroupRepository, SqliteOrganizationRepository, SqliteSessionRepository,
    SqliteTokenRepository, migrations,
};
use enclave_tenancy::{
    FetchGeneralGroupAction, GroupCollection, GroupRepository, NewGroup, NewOrganization,
    NewSession, NewToken, OrganizationRepository, SessionProfile, SessionRepository, StoreConfig,
    StoreError, TokenRepository,
};
use serial_test::serial;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite database");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

#[tokio::test]
#[serial]
async fn test_migrations_are_idempotent() {
    let pool = setup_db().await;
    migrations::run(&pool)
        .await
        .expect("Second migration run failed");
}

#[tokio::test]
#[serial]
async fn test_token_repository() {
    let pool = setup_db().await;
    let repo = SqliteTokenRepository::new(pool);

    let token = repo
        .create(NewToken::issue("jane@example.com", "1718000000000", 32))
        .await
        .expect("Failed to create token");
    assert_eq!(token.token.len(), 32);

    let found = repo
        .find_by_token(&token.token)
        .await
        .expect("Failed to query")
        .expect("Token not found");
    assert_eq!(found, token);
    assert_eq!(found.token_valid_till_timestamp, "1718000000000");

    // duplicates are not rejected at this layer
    repo.create(NewToken {
        email: "jane@example.com".to_owned(),
        token: token.token.clone(),
        token_valid_till_timestamp: "1718000000000".to_owned(),
    })
    .await
    .expect("Duplicate token should be accepted");
    assert_eq!(repo.find_by_email("jane@example.com").await.unwrap().len(), 2);

    assert_eq!(repo.delete_by_email("jane@example.com").await.unwrap(), 2);
    assert!(repo.find_by_token(&token.token).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_group_name_unique_per_collection() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool);
    let team_a = GroupCollection::for_team("team-a");
    let team_b = GroupCollection::for_team("team-b");

    repo.create(&team_a, NewGroup::default())
        .await
        .expect("Failed to create group");

    let err = repo
        .create(&team_a, NewGroup::default())
        .await
        .expect_err("Second users group should be rejected");
    assert_eq!(err, StoreError::DuplicateKey { field: "name" });

    repo.create(&team_b, NewGroup::default())
        .await
        .expect("Other collections are independent");
}

#[tokio::test]
#[serial]
async fn test_group_membership_join_table() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool);
    let coll = GroupCollection::default();

    let group = repo
        .create(
            &coll,
            NewGroup {
                organization_id: Some("org-1".to_owned()),
                owner_id: Some("u1".to_owned()),
                user_ids: vec!["u1".to_owned(), "u2".to_owned(), "u1".to_owned()],
                ..NewGroup::named("admins")
            },
        )
        .await
        .unwrap();
    assert_eq!(group.user_ids, vec!["u1".to_owned(), "u2".to_owned()]);

    let group = repo.add_member(&coll, &group.id, "u3").await.unwrap();
    let group = repo.add_member(&coll, &group.id, "u3").await.unwrap();
    assert_eq!(group.user_ids.len(), 3);

    let group = repo.remove_member(&coll, &group.id, "u1").await.unwrap();
    assert_eq!(group.user_ids, vec!["u2".to_owned(), "u3".to_owned()]);

    let reloaded = repo.find_by_id(&coll, &group.id).await.unwrap().unwrap();
    assert_eq!(reloaded, group);

    let by_org = repo.find_by_organization(&coll, "org-1").await.unwrap();
    assert_eq!(by_org.len(), 1);

    let err = repo.add_member(&coll, "missing", "u1").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);

    repo.delete(&coll, &group.id).await.unwrap();
    assert!(repo.find_by_id(&coll, &group.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_group_membership_after_delete_is_not_found() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool);
    let coll = GroupCollection::for_team("t1");

    let group = repo.create(&coll, NewGroup::named("admins")).await.unwrap();

    let err = repo
        .add_member(&GroupCollection::for_team("t2"), &group.id, "u1")
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound);

    repo.delete(&coll, &group.id).await.unwrap();

    let err = repo.add_member(&coll, &group.id, "u1").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);
    let err = repo.remove_member(&coll, &group.id, "u1").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

#[tokio::test]
#[serial]
async fn test_find_by_organization_loads_each_groups_members() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool);
    let coll = GroupCollection::for_team("t1");
    let in_org = |name: &str, users: &[&str]| NewGroup {
        organization_id: Some("org-1".to_owned()),
        user_ids: users.iter().map(|u| (*u).to_owned()).collect(),
        ..NewGroup::named(name)
    };

    repo.create(&coll, in_org("general", &["u1", "u2"])).await.unwrap();
    repo.create(&coll, in_org("admins", &["u3"])).await.unwrap();
    repo.create(&coll, in_org("empty", &[])).await.unwrap();
    repo.create(&GroupCollection::for_team("t2"), in_org("general", &["u9"]))
        .await
        .unwrap();

    let groups = repo.find_by_organization(&coll, "org-1").await.unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["admins", "empty", "general"]);
    assert_eq!(groups[0].user_ids, vec!["u3".to_owned()]);
    assert!(groups[1].user_ids.is_empty());
    assert_eq!(groups[2].user_ids, vec!["u1".to_owned(), "u2".to_owned()]);
}

#[tokio::test]
#[serial]
async fn test_fetch_general_group() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool);

    let general = repo
        .create(&GroupCollection::for_team("t1"), NewGroup::named("general"))
        .await
        .unwrap();

    let action = FetchGeneralGroupAction::new(repo.clone());
    assert_eq!(action.execute("t1").await.unwrap(), Some(general.id));
    assert_eq!(action.execute("t2").await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_fetch_general_group_storage_failure() {
    let pool = setup_db().await;
    let repo = SqliteGroupRepository::new(pool.clone());
    pool.close().await;

    let action = FetchGeneralGroupAction::new(repo);
    let err = action.execute("t1").await.unwrap_err();
    assert_eq!(err.id, 400);
}

#[tokio::test]
#[serial]
async fn test_organization_soft_delete() {
    let pool = setup_db().await;
    let repo = SqliteOrganizationRepository::with_config(
        pool,
        StoreConfig::default().with_default_domain("example.com"),
    );

    let org = repo
        .create(NewOrganization {
            name: "Acme".to_owned(),
            sub_domain: "acme".to_owned(),
            owner_id: Some("u1".to_owned()),
            ..Default::default()
        })
        .await
        .expect("Failed to create organization");
    assert_eq!(org.fqdn, "acme.example.com");
    assert!(!org.is_deleted);

    let found = repo.find_by_sub_domain("acme").await.unwrap().unwrap();
    assert_eq!(found.id, org.id);

    repo.soft_delete(&org.id).await.unwrap();
    assert!(repo.find_by_id(&org.id).await.unwrap().is_none());
    assert!(repo.find_by_sub_domain("acme").await.unwrap().is_none());
    assert!(repo.find_by_owner("u1").await.unwrap().is_empty());

    let raw = repo
        .find_by_id_including_deleted(&org.id)
        .await
        .unwrap()
        .unwrap();
    assert!(raw.is_deleted);

    let err = repo
        .create(NewOrganization {
            name: "Acme Again".to_owned(),
            sub_domain: "acme".to_owned(),
            ..Default::default()
        })
        .await
        .expect_err("Subdomain of deleted organization must stay reserved");
    assert_eq!(err, StoreError::DuplicateKey { field: "subDomain" });

    let restored = repo.restore(&org.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(repo.find_by_owner("u1").await.unwrap().len(), 1);

    assert_eq!(
        repo.soft_delete("missing").await.unwrap_err(),
        StoreError::NotFound
    );
}

#[tokio::test]
#[serial]
async fn test_session_repository() {
    let pool = setup_db().await;
    let repo = SqliteSessionRepository::new(pool);

    let profile = SessionProfile {
        name: Some("Jane".to_owned()),
        avatar: None,
        email: Some("jane@example.com".to_owned()),
    };
    let session = repo
        .create(NewSession {
            user_id: "u1".to_owned(),
            jwt: "jwt-1".to_owned(),
            profile: profile.clone(),
        })
        .await
        .expect("Failed to create session");
    assert_eq!(session.profile(), profile);

    let found = repo.find_by_jwt("jwt-1").await.unwrap().unwrap();
    assert_eq!(found.id, session.id);

    let relogged = repo.record_login(&session.id, "jwt-2").await.unwrap();
    assert_eq!(relogged.jwt, "jwt-2");
    assert!(repo.find_by_jwt("jwt-1").await.unwrap().is_none());

    let renamed = SessionProfile {
        name: Some("Jane Doe".to_owned()),
        ..profile
    };
    assert_eq!(repo.update_profile("u1", &renamed).await.unwrap(), 1);
    let found = repo.find(&session.id).await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("Jane Doe"));

    assert_eq!(repo.destroy_user_sessions("u1").await.unwrap(), 1);
    assert!(repo.find(&session.id).await.unwrap().is_none());
}
