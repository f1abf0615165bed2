mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};

use common::{TestApp, ALICE, BOB};
use pawtracker_api::store::StoreError;

fn multipart_request(token: &str, field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "pawtracker-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/pets/upload_photo")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn create_assigns_owner_from_credential() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let res = app
        .request(
            Method::POST,
            "/api/pets",
            Some(&token),
            Some(json!({"name": "Rex", "species": "Dog", "birthdate": "2021-04-02", "owner_id": BOB})),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["owner_id"], ALICE);
    assert_eq!(res.body["data"]["name"], "Rex");
    assert_eq!(res.body["data"]["birthdate"], "2021-04-02");

    let rows = app.store.rows("pets").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["owner_id"], ALICE);
}

#[tokio::test]
async fn owner_with_non_canonical_uuid_subject_keeps_access() {
    let app = TestApp::new();
    let subject = "0F4A3A55-1111-4A57-9D8E-1F2A3B4C5D6E";
    let token = app.token_for(subject);

    let res = app
        .request(Method::POST, "/api/pets", Some(&token), Some(json!({"name": "Rex", "species": "Dog"})))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["owner_id"], subject);
    let id = res.body["data"]["id"].as_str().unwrap().to_string();

    let res = app.get(&format!("/api/pets/{}", id), &token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], "Rex");

    let res = app.get("/api/pets", &token).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_validates_payload() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let res = app
        .request(Method::POST, "/api/pets", Some(&token), Some(json!({"name": "", "species": "Dog"})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["name"].is_string());

    let res = app
        .request(Method::POST, "/api/pets", Some(&token), Some(json!({"species": "Dog"})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");
    assert!(app.store.rows("pets").await.is_empty());
}

#[tokio::test]
async fn create_requires_uuid_subject() {
    let app = TestApp::new();
    let token = app.token_for("not-a-uuid");

    let res = app
        .request(Method::POST, "/api/pets", Some(&token), Some(json!({"name": "Rex", "species": "Dog"})))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid user identifier");
}

#[tokio::test]
async fn list_returns_only_callers_pets() {
    let app = TestApp::new();
    app.seed_pet(ALICE, "Rex").await;
    app.seed_pet(ALICE, "Luna").await;
    app.seed_pet(BOB, "Max").await;

    let res = app.get("/api/pets", &app.token_for(ALICE)).await;

    assert_eq!(res.status, StatusCode::OK);
    let pets = res.body["data"].as_array().unwrap();
    assert_eq!(pets.len(), 2);
    assert!(pets.iter().all(|pet| pet["owner_id"] == ALICE));
}

#[tokio::test]
async fn owner_can_read_update_and_delete() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);
    let id = app.seed_pet(ALICE, "Rex").await;
    let uri = format!("/api/pets/{}", id);

    let res = app.get(&uri, &token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], "Rex");

    let res = app
        .request(Method::PUT, &uri, Some(&token), Some(json!({"name": "Rexy", "breed": null})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], "Rexy");
    assert_eq!(res.body["data"]["breed"], Value::Null);
    assert_eq!(res.body["data"]["species"], "Dog");

    let res = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert_eq!(res.body, Value::Null);
    assert!(app.store.rows("pets").await.is_empty());
}

#[tokio::test]
async fn non_owner_gets_403_and_nothing_changes() {
    let app = TestApp::new();
    let bob = app.token_for(BOB);
    let id = app.seed_pet(ALICE, "Rex").await;
    let uri = format!("/api/pets/{}", id);

    let res = app.get(&uri, &bob).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Guard runs before the body is decoded or validated
    let res = app.request(Method::PUT, &uri, Some(&bob), Some(json!({"name": ""}))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.request(Method::PUT, &uri, Some(&bob), Some(json!({"birthdate": "x"}))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let rows = app.store.rows("pets").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Rex");
}

#[tokio::test]
async fn missing_pet_is_404_for_everyone() {
    let app = TestApp::new();
    let uri = format!("/api/pets/{}", uuid::Uuid::new_v4());

    for method in [Method::GET, Method::DELETE] {
        let res = app.request(method, &uri, Some(&app.token_for(ALICE)), None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn malformed_path_id_is_400() {
    let app = TestApp::new();

    let res = app.get("/api/pets/not-a-uuid", &app.token_for(ALICE)).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_update_is_400() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);
    let id = app.seed_pet(ALICE, "Rex").await;

    let res = app
        .request(Method::PUT, &format!("/api/pets/{}", id), Some(&token), Some(json!({})))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "No data provided for update");
}

#[tokio::test]
async fn store_failures_during_guard_map_to_5xx() {
    let uri = format!("/api/pets/{}", uuid::Uuid::new_v4());
    let token = TestApp::new().token_for(ALICE);
    let cases: [(fn() -> StoreError, StatusCode); 2] = [
        (|| StoreError::Connection("timed out".into()), StatusCode::SERVICE_UNAVAILABLE),
        (|| StoreError::UnexpectedResponse("<html>".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (make, expected) in cases {
        let router = common::failing_router(make);
        let request = Request::builder()
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let res = common::send(&router, request).await;
        assert_eq!(res.status, expected);
        assert!(!res.body["message"].as_str().unwrap().contains("<html>"));
    }
}

#[tokio::test]
async fn photo_upload_stores_image_under_owner_folder() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let res = app
        .send(multipart_request(&token, "file", "rex.png", "image/png", b"\x89PNG fake"))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let url = res.body["data"]["photo_url"].as_str().unwrap();
    let prefix = format!("memory://pet_photos/user_{}/", ALICE);
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.ends_with(".png"));

    let path = url.trim_start_matches("memory://pet_photos/");
    let blob = app.store.blob("pet_photos", path).await.expect("blob stored");
    assert_eq!(blob.content_type, "image/png");
    assert_eq!(blob.bytes, b"\x89PNG fake");
}

#[tokio::test]
async fn photo_upload_rejects_non_images() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let res = app
        .send(multipart_request(&token, "file", "notes.txt", "text/plain", b"hello"))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "File type not allowed. Only images are accepted.");

    let res = app
        .send(multipart_request(&token, "other", "rex.png", "image/png", b"png"))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "No file provided");
}

#[tokio::test]
async fn photo_upload_requires_credential() {
    let app = TestApp::new();
    let mut request = multipart_request("ignored", "file", "rex.png", "image/png", b"png");
    request.headers_mut().remove(header::AUTHORIZATION);

    let res = app.send(request).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_update_with_undecodable_body_is_400() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);
    let id = app.seed_pet(ALICE, "Rex").await;

    let res = app
        .request(Method::PUT, &format!("/api/pets/{}", id), Some(&token), Some(json!({"birthdate": "x"})))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");
}
