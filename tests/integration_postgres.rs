#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};
use userbase_server::domain::auth::AccessToken;
use userbase_server::domain::user::{NewUser, TAKEN};
use userbase_server::error::AppError;
use userbase_server::storage::UserStore;
use userbase_server::storage::user_repo::PgUserRepository;
use uuid::Uuid;

mod common;

fn new_user(email: &str, token: &str) -> NewUser {
    NewUser {
        id: Uuid::now_v7(),
        name: "Ann".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        token_hash: AccessToken::hash(token),
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_pg_insert_and_lookup() {
    let Some(pool) = common::get_test_pool().await else { return };
    let repo = PgUserRepository::new(pool);
    let email = format!("{}@x.com", unique("lookup"));
    let token = unique("token");

    let user = repo.insert(new_user(&email, &token)).await.unwrap();

    let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, email);
    assert_eq!(by_id.name, "Ann");

    let by_token = repo.find_by_token_hash(&AccessToken::hash(&token)).await.unwrap().unwrap();
    assert_eq!(by_token.id, user.id);

    let by_email = repo.find_by_email(&email.to_uppercase()).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.find_by_token_hash(&AccessToken::hash(&unique("missing"))).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pg_list_is_oldest_first() {
    let Some(pool) = common::get_test_pool().await else { return };
    let repo = PgUserRepository::new(pool);

    let first = repo.insert(new_user(&format!("{}@x.com", unique("first")), &unique("t"))).await.unwrap();
    let second = repo.insert(new_user(&format!("{}@x.com", unique("second")), &unique("t"))).await.unwrap();

    // The table is shared with other tests, so only the relative order is checked.
    let ids: Vec<Uuid> =
        repo.list().await.unwrap().into_iter().map(|u| u.id).filter(|id| *id == first.id || *id == second.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_pg_duplicate_email_ignores_case() {
    let Some(pool) = common::get_test_pool().await else { return };
    let repo = PgUserRepository::new(pool);
    let local = unique("dup");

    repo.insert(new_user(&format!("{local}@x.com"), &unique("t"))).await.unwrap();
    let err = repo.insert(new_user(&format!("{}@X.COM", local.to_uppercase()), &unique("t"))).await.unwrap_err();

    let AppError::Validation(errors) = err else { panic!("expected validation error, got {err:?}") };
    assert_eq!(errors.get("email"), Some(&[TAKEN.to_string()][..]));
}

#[tokio::test]
async fn test_pg_duplicate_token_maps_to_validation() {
    let Some(pool) = common::get_test_pool().await else { return };
    let repo = PgUserRepository::new(pool);
    let token = unique("shared");

    repo.insert(new_user(&format!("{}@x.com", unique("a")), &token)).await.unwrap();
    let err = repo.insert(new_user(&format!("{}@x.com", unique("b")), &token)).await.unwrap_err();

    let AppError::Validation(errors) = err else { panic!("expected validation error, got {err:?}") };
    assert_eq!(errors.get("token"), Some(&[TAKEN.to_string()][..]));
}

#[tokio::test]
async fn test_pg_ping() {
    let Some(pool) = common::get_test_pool().await else { return };
    assert!(PgUserRepository::new(pool).ping().await.is_ok());
}

#[tokio::test]
async fn test_pg_create_then_show_over_http() {
    let Some(pool) = common::get_test_pool().await else { return };
    let app = common::TestApp::spawn_with_database(pool).await;
    let email = format!("{}@x.com", unique("http"));
    let token = unique("http_token");

    let resp = app.create_user(&common::user_payload("Ann", &email, "p1", &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = resp.json().await.unwrap();

    let resp = app.get_authed(&format!("/api/v1/users/{}", created["id"].as_str().unwrap()), &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let shown: Value = resp.json().await.unwrap();
    assert_eq!(shown["email"], email.as_str());

    let resp = app.create_user(&common::user_payload("Ann", &email.to_uppercase(), "p1", &unique("t"))).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "failed", "status": 500 }));
}
