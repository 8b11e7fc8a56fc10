//! User persistence and credential tests against a real Postgres.

mod common;

use server_core::common::Role;
use server_core::domains::auth::{hash_password, verify_password, JwtService};
use server_core::domains::users::{ProfileUpdate, User};

#[tokio::test]
async fn test_insert_and_find_user() {
    let pool = common::test_pool().await;

    let user = common::sample_user("volunteer").insert(&pool).await.unwrap();
    assert_ne!(user.id, uuid::Uuid::nil());
    assert_eq!(user.role, "volunteer");
    assert_eq!(user.membership_status, "none");

    let found = User::find_by_email(&user.email, &pool).await.unwrap();
    assert_eq!(found.unwrap().id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let pool = common::test_pool().await;

    let mut first = common::sample_user("volunteer");
    first = first.insert(&pool).await.unwrap();

    let mut second = common::sample_user("volunteer");
    second.email = first.email.clone();

    let result = second.insert(&pool).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_partial_profile_update_keeps_other_fields() {
    let pool = common::test_pool().await;

    let user = common::sample_user("member").insert(&pool).await.unwrap();

    let update = ProfileUpdate {
        phone: Some("+251922000000".to_string()),
        ..Default::default()
    };
    let updated = User::update_profile(user.id, &update, &pool)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.phone, "+251922000000");
    assert_eq!(updated.name, user.name);
    assert_eq!(updated.email, user.email);
}

#[tokio::test]
async fn test_last_login_stamp() {
    let pool = common::test_pool().await;

    let user = common::sample_user("volunteer").insert(&pool).await.unwrap();
    assert!(user.last_login_at.is_none());

    User::touch_last_login(user.id, &pool).await.unwrap();
    let reloaded = User::find_by_id(user.id, &pool).await.unwrap().unwrap();
    assert!(reloaded.last_login_at.is_some());
}

#[tokio::test]
async fn test_password_and_token_round_trip() {
    let pool = common::test_pool().await;

    let mut user = common::sample_user("admin");
    user.password_hash = hash_password("s3cret-passphrase").unwrap();
    let user = user.insert(&pool).await.unwrap();

    assert!(verify_password("s3cret-passphrase", &user.password_hash).unwrap());
    assert!(!verify_password("wrong", &user.password_hash).unwrap());

    let jwt = JwtService::new("integration-secret", "volnet".to_string());
    let token = jwt.create_token(user.id, Role::Admin).unwrap();
    let claims = jwt.verify_token(&token).unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn test_stats_counters() {
    let pool = common::test_pool().await;

    let user = common::sample_user("volunteer").insert(&pool).await.unwrap();

    User::add_completed_activity(user.id, 3.5, &pool).await.unwrap();
    User::add_completed_activity(user.id, 1.5, &pool).await.unwrap();
    User::increment_recognitions(user.id, &pool).await.unwrap();

    let reloaded = User::find_by_id(user.id, &pool).await.unwrap().unwrap();
    assert_eq!(reloaded.total_hours, 5.0);
    assert_eq!(reloaded.activities_completed, 2);
    assert_eq!(reloaded.recognitions_received, 1);
}
