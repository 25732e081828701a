//! Account helpers for integration tests.

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use roost_db::AccountRepository;
use serde_json::Value;

use super::fixtures::png_part;
use super::{api_path, TestApp};

pub const TEST_PASSWORD: &str = "s3cret-pass";

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub fn registration_form(name: &str, email: &str, password: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("name", name.to_string())
        .add_text("email", email.to_string())
        .add_text("password", password.to_string())
        .add_part("avatar", png_part("portrait.png"))
}

/// Token the verification email would have carried.
pub async fn verification_token(app: &TestApp, email: &str) -> String {
    app.store
        .find_by_email(email)
        .await
        .unwrap()
        .and_then(|account| account.verification_token)
        .expect("account has a pending verification token")
}

/// Register, follow the verification link, and return the issued credential.
pub async fn register_verified_user(app: &TestApp, name: &str, email: &str) -> TestUser {
    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .multipart(registration_form(name, email, TEST_PASSWORD))
        .await;
    response.assert_status(StatusCode::CREATED);

    let token = verification_token(app, email).await;
    let response = app
        .client()
        .get(&api_path(&format!("/auth/verify/{}", token)))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    TestUser {
        id: body["user"]["id"].as_str().unwrap().to_string(),
        email: email.to_string(),
        token: body["token"].as_str().unwrap().to_string(),
    }
}
