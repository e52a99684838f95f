//! Identity and document store clients against a mock HTTP server.

use chrono::NaiveDate;
use httpmock::prelude::*;
use secrecy::SecretString;

use farm_assist::auth::AuthClient;
use farm_assist::config::AuthConfig;
use farm_assist::error::AuthError;
use farm_assist::store::{CropRecord, DocumentStore, LandRecord, RestDocumentStore};

fn auth_client(server: &MockServer) -> AuthClient {
    AuthClient::new(&AuthConfig {
        base_url: server.base_url(),
        api_key: SecretString::from("web-key"),
    })
}

#[tokio::test]
async fn sign_in_returns_identity() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:signInWithPassword")
            .query_param("key", "web-key");
        then.status(200).json_body(serde_json::json!({
            "localId": "uid-1",
            "email": "farmer@example.com",
            "idToken": "token-abc"
        }));
    });

    let identity = auth_client(&server)
        .sign_in("farmer@example.com", "hunter22")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(identity.uid, "uid-1");
    assert_eq!(identity.email.as_deref(), Some("farmer@example.com"));
    assert!(!identity.anonymous);
}

#[tokio::test]
async fn unknown_email_maps_to_user_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signInWithPassword");
        then.status(400).json_body(serde_json::json!({
            "error": { "code": 400, "message": "EMAIL_NOT_FOUND" }
        }));
    });

    let result = auth_client(&server).sign_in("nobody@example.com", "pw").await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn weak_password_carries_detail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(400).json_body(serde_json::json!({
            "error": { "message": "WEAK_PASSWORD : Password should be at least 6 characters" }
        }));
    });

    let result = auth_client(&server).sign_up("new@example.com", "123").await;
    match result {
        Err(AuthError::WeakPassword(detail)) => assert!(detail.contains("6 characters")),
        other => panic!("expected WeakPassword, got {other:?}"),
    }
}

#[tokio::test]
async fn anonymous_session_has_no_email() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(200).json_body(serde_json::json!({
            "localId": "anon-7",
            "idToken": "token-anon"
        }));
    });

    let identity = auth_client(&server).sign_in_anonymous().await.unwrap();
    assert!(identity.anonymous);
    assert!(identity.email.is_none());
}

#[tokio::test]
async fn store_put_then_get_land() {
    let server = MockServer::start();
    let land = LandRecord::new("South field", 1.8, "clay");

    let put = server.mock(|when, then| {
        when.method(PUT).path(format!("/users/u1/lands/{}", land.id));
        then.status(200);
    });
    let get = server.mock(|when, then| {
        when.method(GET).path(format!("/users/u1/lands/{}", land.id));
        then.status(200).json_body(serde_json::to_value(&land).unwrap());
    });

    let store = RestDocumentStore::new(server.base_url());
    store.put_land("u1", &land).await.unwrap();
    let fetched = store.get_land("u1", &land.id).await.unwrap();

    put.assert();
    get.assert();
    assert_eq!(fetched, Some(land));
}

#[tokio::test]
async fn store_missing_document_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users/u1/lands/nope");
        then.status(404);
    });

    let store = RestDocumentStore::new(server.base_url());
    assert_eq!(store.get_land("u1", "nope").await.unwrap(), None);
}

#[tokio::test]
async fn store_lists_crops_under_land() {
    let server = MockServer::start();
    let sowing = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
    let crop = CropRecord::new("maize", sowing);

    server.mock(|when, then| {
        when.method(GET).path("/users/u1/lands/l1/crops");
        then.status(200)
            .json_body(serde_json::to_value(vec![&crop]).unwrap());
    });

    let store = RestDocumentStore::new(server.base_url());
    let crops = store.list_crops("u1", "l1").await.unwrap();
    assert_eq!(crops, vec![crop]);
}
