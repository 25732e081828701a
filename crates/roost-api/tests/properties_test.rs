//! Property listing API integration tests.
//!
//! Run with: `cargo test -p roost-api --test properties_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use helpers::auth::register_verified_user;
use helpers::fixtures::png_part;
use helpers::{api_path, setup_test_app};
use serde_json::Value;

fn listing_form(title: &str, guests: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("description", "Two rooms by the river")
        .add_text("price_per_night", "120")
        .add_text("bedrooms", "2")
        .add_text("guests", guests.to_string())
        .add_text("country", "Portugal")
        .add_text("country_code", "PT")
        .add_text("category", "apartment")
        .add_part("image", png_part("house.png"))
}

#[tokio::test]
async fn test_create_and_browse_listing() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;
    let client = app.client();

    let response = client
        .post(&api_path("/properties"))
        .authorization_bearer(&user.token)
        .multipart(listing_form("Riverside <flat>", "4"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["status"], 201);
    let property = &body["data"]["property"];
    assert_eq!(property["title"], "Riverside &lt;flat&gt;");
    assert_eq!(property["guests"], 4);
    assert!(property["image"]["location"]
        .as_str()
        .unwrap()
        .starts_with("properties/house_"));
    assert_eq!(app.files_in("properties"), 1);

    // browsing needs no credential
    let id = property["id"].as_str().unwrap();
    let response = client.get(&api_path(&format!("/properties/{}", id))).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["property"]["country_code"], "PT");

    let list = client.get(&api_path("/properties")).await.json::<Value>();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let response = client
        .get(&api_path(&format!("/properties?owner_id={}", uuid::Uuid::new_v4())))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_invalid_fields_store_no_file() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;

    let response = app
        .client()
        .post(&api_path("/properties"))
        .authorization_bearer(&user.token)
        .multipart(listing_form("Tiny", "0"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["guests"].is_string());
    assert_eq!(app.files_in("properties"), 0);
}

#[tokio::test]
async fn test_blank_title_rejected_and_markup_title_accepted() {
    let app = setup_test_app().await;
    let user = register_verified_user(&app, "Ana", "ana@x.com").await;
    let client = app.client();

    let response = client
        .post(&api_path("/properties"))
        .authorization_bearer(&user.token)
        .multipart(listing_form("    ", "2"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["details"]["title"],
        "title is required"
    );
    assert_eq!(app.files_in("properties"), 0);

    let title = "<\"'>&".repeat(51);
    let response = client
        .post(&api_path("/properties"))
        .authorization_bearer(&user.token)
        .multipart(listing_form(&title, "2"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let stored = response.json::<Value>()["data"]["property"]["title"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(stored, "&lt;&#34;&#39;&gt;&amp;".repeat(51));
}

#[tokio::test]
async fn test_only_owner_can_change_listing() {
    let app = setup_test_app().await;
    let ana = register_verified_user(&app, "Ana", "ana@x.com").await;
    let ben = register_verified_user(&app, "Ben", "ben@x.com").await;
    let client = app.client();

    let response = client
        .post(&api_path("/properties"))
        .authorization_bearer(&ana.token)
        .multipart(listing_form("Loft", "2"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["property"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = client
        .put(&api_path(&format!("/properties/{}", id)))
        .authorization_bearer(&ben.token)
        .multipart(MultipartForm::new().add_text("title", "Ben's loft"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], "FORBIDDEN");

    client
        .delete(&api_path(&format!("/properties/{}", id)))
        .authorization_bearer(&ben.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = client
        .put(&api_path(&format!("/properties/{}", id)))
        .authorization_bearer(&ana.token)
        .multipart(
            MultipartForm::new()
                .add_text("price_per_night", "95")
                .add_part("image", png_part("new.png")),
        )
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["property"]["price_per_night"], 95);
    assert_eq!(body["data"]["property"]["title"], "Loft");

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(app.files_in("properties"), 1);

    client
        .delete(&api_path(&format!("/properties/{}", id)))
        .authorization_bearer(&ana.token)
        .await
        .assert_status_ok();
    client
        .get(&api_path(&format!("/properties/{}", id)))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
