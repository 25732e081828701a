//! Account registration, verification and credential tests.
//!
//! Run with: `cargo test -p roost-api --test auth_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use helpers::auth::{registration_form, register_verified_user, verification_token, TEST_PASSWORD};
use helpers::{api_path, setup_test_app};
use roost_db::AccountRepository;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_verify_then_duplicate() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post(&api_path("/auth/register"))
        .multipart(registration_form("Ana", "ana@x.com", "0123456789"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["status"], 201);
    assert!(body["message"].as_str().unwrap().contains("verify"));
    assert_eq!(body["user"]["email"], "ana@x.com");
    assert_eq!(body["user"]["email_verified"], false);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("verification_token").is_none());
    assert_eq!(app.files_in("avatars"), 1);

    let token = verification_token(&app, "ana@x.com").await;
    let response = client
        .get(&api_path(&format!("/auth/verify/{}", token)))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], 200);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email_verified"], true);

    let response = client
        .post(&api_path("/auth/register"))
        .multipart(registration_form("Ana Again", "ana@x.com", "0123456789"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["status"], 400);
    assert_eq!(app.files_in("avatars"), 1);
}

#[tokio::test]
async fn test_verification_token_is_single_use() {
    let app = setup_test_app().await;
    let client = app.client();

    client
        .post(&api_path("/auth/register"))
        .multipart(registration_form("Ana", "ana@x.com", TEST_PASSWORD))
        .await
        .assert_status(StatusCode::CREATED);
    let token = verification_token(&app, "ana@x.com").await;

    client
        .get(&api_path(&format!("/auth/verify/{}", token)))
        .await
        .assert_status_ok();

    let response = client
        .get(&api_path(&format!("/auth/verify/{}", token)))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_register_requires_avatar_and_valid_fields() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("name", "Ana")
        .add_text("email", "not-an-email")
        .add_text("password", "short");
    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let details = body["details"].as_object().unwrap();
    assert!(details.contains_key("avatar"));
    assert!(details.contains_key("email"));
    assert!(details.contains_key("password"));
    assert_eq!(app.store.account_count(), 0);
}

#[tokio::test]
async fn test_login() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;
    let client = app.client();

    let response = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert!(body["token"].is_string());

    let response = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": 42 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;
    let client = app.client();

    // unknown addresses get the same answer
    let unknown = client
        .post(&api_path("/auth/forgot-password"))
        .json(&json!({ "email": "nobody@x.com" }))
        .await;
    unknown.assert_status_ok();

    let response = client
        .post(&api_path("/auth/forgot-password"))
        .json(&json!({ "email": user.email }))
        .await;
    response.assert_status_ok();
    let unknown_body: Value = unknown.json();
    let body: Value = response.json();
    assert_eq!(unknown_body["message"], body["message"]);

    let reset_token = app
        .store
        .find_by_email(&user.email)
        .await
        .unwrap()
        .and_then(|account| account.reset_token)
        .unwrap();

    // the emailed link is opened with a GET before the new password is posted
    let reset_path = api_path(&format!("/auth/reset-password/{}", reset_token));
    client.get(&reset_path).await.assert_status_ok();

    let response = client
        .post(&reset_path)
        .json(&json!({ "password": "a-brand-new-password" }))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["token"].is_string());

    let response = client.get(&reset_path).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");

    client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": user.email, "password": "a-brand-new-password" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client.get(&api_path("/accounts/me")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    client
        .get(&api_path("/accounts/me"))
        .authorization_bearer("not-a-jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_and_delete() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;
    let client = app.client();

    let response = client
        .get(&api_path("/accounts/me"))
        .authorization_bearer(&user.token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["user"]["name"], "Ana");

    let form = MultipartForm::new()
        .add_text("bio", "Host in <b>Lisbon</b>")
        .add_part("avatar", helpers::fixtures::png_part("new.png"));
    let response = client
        .put(&api_path("/accounts/me"))
        .authorization_bearer(&user.token)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["bio"], "Host in &lt;b&gt;Lisbon&lt;/b&gt;");

    // the previous avatar is removed in the background
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(app.files_in("avatars"), 1);

    client
        .delete(&api_path("/accounts/me"))
        .authorization_bearer(&user.token)
        .await
        .assert_status_ok();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(app.store.account_count(), 0);
    assert_eq!(app.files_in("avatars"), 0);
    client
        .get(&api_path("/accounts/me"))
        .authorization_bearer(&user.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
