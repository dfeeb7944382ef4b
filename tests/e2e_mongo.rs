//! End-to-end tests for MongoDB repositories.
//!
//! Requires a running server. Run with:
//! `MONGODB_URI=mongodb://localhost:27017 cargo test --features mongo --test e2e_mongo`
//!
//! Each test uses its own database and returns early when `MONGODB_URI` is unset.

#![cfg(feature = "mongo")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use enclave_tenancy::mongo::{self, MongoGroupRepository, MongoInvitationRepository};
use enclave_tenancy::{
    FetchGeneralGroupAction, GroupCollection, GroupRepository, InvitationRepository, NewGroup,
    NewInvitation, NewToken, StoreError, TokenRepository,
};
use mongodb::Database;

async fn fresh_db(name: &str) -> Option<Database> {
    let uri = std::env::var("MONGODB_URI").ok()?;
    let db = mongo::connect(&uri, &format!("enclave_tenancy_{name}"))
        .await
        .expect("Failed to connect to MongoDB");
    db.drop().await.expect("Failed to reset database");
    Some(db)
}

async fn setup_db(name: &str) -> Option<Database> {
    let db = fresh_db(name).await?;
    mongo::ensure_indexes(&db)
        .await
        .expect("Failed to create indexes");
    Some(db)
}

#[tokio::test]
async fn test_token_repository() {
    let Some(db) = setup_db("tokens").await else {
        return;
    };
    let (tokens, _, _) = mongo::create_repositories(&db);

    let token = tokens
        .create(NewToken::issue("jane@example.com", "1718000000000", 32))
        .await
        .unwrap();
    assert_eq!(token.id.len(), 24);

    let found = tokens.find_by_token(&token.token).await.unwrap().unwrap();
    assert_eq!(found, token);

    tokens.delete(&token.id).await.unwrap();
    assert!(tokens.find_by_token(&token.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invitation_email_unique() {
    let Some(db) = setup_db("invitations").await else {
        return;
    };
    let (_, invitations, _) = mongo::create_repositories(&db);

    let invite = NewInvitation {
        email: "jane@example.com".to_owned(),
        token: Some("t1".to_owned()),
        ..Default::default()
    };
    invitations.create(invite.clone()).await.unwrap();

    let err = invitations.create(invite).await.unwrap_err();
    assert_eq!(err, StoreError::DuplicateKey { field: "email" });

    let consumed = invitations.consume("t1").await.unwrap().unwrap();
    assert_eq!(consumed.email, "jane@example.com");
    assert!(invitations.find_by_email("jane@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invitation_email_unique_without_startup_indexes() {
    let Some(db) = fresh_db("invitations_lazy_index").await else {
        return;
    };
    let invitations = MongoInvitationRepository::new(&db);

    let invite = NewInvitation {
        email: "jane@example.com".to_owned(),
        ..Default::default()
    };
    invitations.create(invite.clone()).await.unwrap();

    let err = invitations.create(invite).await.unwrap_err();
    assert_eq!(err, StoreError::DuplicateKey { field: "email" });
}

#[tokio::test]
async fn test_groups_per_team_collection() {
    let Some(db) = setup_db("groups").await else {
        return;
    };
    let repo = MongoGroupRepository::new(&db);
    let team_a = GroupCollection::for_team("a");
    let team_b = GroupCollection::for_team("b");

    let users = repo.create(&team_a, NewGroup::default()).await.unwrap();
    let err = repo.create(&team_a, NewGroup::default()).await.unwrap_err();
    assert_eq!(err, StoreError::DuplicateKey { field: "name" });
    repo.create(&team_b, NewGroup::default()).await.unwrap();

    let group = repo.add_member(&team_a, &users.id, "u1").await.unwrap();
    let group = repo.add_member(&team_a, &group.id, "u1").await.unwrap();
    assert_eq!(group.user_ids, vec!["u1".to_owned()]);

    let general = repo
        .create(&team_a, NewGroup::named("general"))
        .await
        .unwrap();
    let action = FetchGeneralGroupAction::new(repo);
    assert_eq!(action.execute("a").await.unwrap(), Some(general.id));
    assert_eq!(action.execute("b").await.unwrap(), None);
}
