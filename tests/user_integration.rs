use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synapse_api_client::SynapseRestClient;
use synapse_api_client::auth::StaticCredentials;
use synapse_api_client::error::SynapseError;
use synapse_api_client::models::{CreateUserRequest, Permission, User, UserQuery};

fn build_client(server: &MockServer) -> SynapseRestClient {
    let gateway = Arc::new(StaticCredentials::new(
        "test_client_id",
        "test_client_secret",
    ));
    SynapseRestClient::builder()
        .base_url(server.uri())
        .gateway(gateway)
        .fingerprint("test_fingerprint")
        .user_ip("127.0.0.1")
        .build()
}

fn user_body() -> serde_json::Value {
    json!({
        "_id": "594e0fa2838454002ea317a0",
        "refresh_token": "refresh_abc123",
        "logins": [{"email": "a@b.com", "scope": "READ_AND_WRITE"}],
        "phone_numbers": ["901-111-1111"],
        "legal_names": ["Test User"],
        "permission": "UNVERIFIED",
        "documents": [],
        "extra": {"note": null, "supp_id": null, "is_business": false, "cip_tag": 1}
    })
}

#[tokio::test]
async fn test_create_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "logins": [{"email": "a@b.com"}],
            "phone_numbers": ["901-111-1111"],
            "legal_names": ["Test User"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let request = CreateUserRequest::new("a@b.com", "901-111-1111", "Test User");
    let user = User::create(&client, &request).await.unwrap();

    assert_eq!(user.legal_names, vec!["Test User"]);
    assert_eq!(user.logins.len(), 1);
    assert_eq!(user.logins[0].email, "a@b.com");
    assert_eq!(user.permission, Permission::Unverified);
    assert_eq!(user.cip_tag, Some(1));
    assert!(user.base_documents.is_empty());
}

#[tokio::test]
async fn test_user_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let user = User::by_id(&client, "594e0fa2838454002ea317a0")
        .await
        .unwrap();

    assert_eq!(user.id, "594e0fa2838454002ea317a0");
    assert_eq!(user.phone_numbers, vec!["901-111-1111"]);
}

#[tokio::test]
async fn test_all_users() {
    let server = MockServer::start().await;

    let mut second = user_body();
    second["_id"] = json!("594e0fa2838454002ea317a1");
    let response = json!({
        "users": [user_body(), second],
        "page": 1,
        "page_count": 1,
        "users_count": 2
    });

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let users = User::all(&client, Some(&UserQuery::default())).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].id, "594e0fa2838454002ea317a1");
}

#[tokio::test]
async fn test_add_phone_number_returns_new_instance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    let mut updated = user_body();
    updated["phone_numbers"] = json!(["901-111-1111", "555-000-0000"]);
    Mock::given(method("PATCH"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .and(body_partial_json(json!({
            "refresh_token": "refresh_abc123",
            "update": {"phone_number": "555-000-0000"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let user = User::by_id(&client, "594e0fa2838454002ea317a0")
        .await
        .unwrap();
    let refreshed = user.add_phone_number("555-000-0000").await.unwrap();

    assert!(refreshed
        .phone_numbers
        .contains(&"555-000-0000".to_string()));
    // The original instance is untouched; only the returned one reflects
    // the server's new state.
    assert_eq!(user.phone_numbers, vec!["901-111-1111"]);
}

#[tokio::test]
async fn test_remove_login_payload_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    let mut updated = user_body();
    updated["logins"] = json!([]);
    Mock::given(method("PATCH"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .and(body_partial_json(json!({
            "update": {"remove_login": {"email": "a@b.com"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let user = User::by_id(&client, "594e0fa2838454002ea317a0")
        .await
        .unwrap();
    let refreshed = user.remove_login("a@b.com").await.unwrap();

    assert!(refreshed.logins.is_empty());
}

#[tokio::test]
async fn test_authenticate_refreshes_oauth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/594e0fa2838454002ea317a0"))
        .and(body_partial_json(json!({"refresh_token": "refresh_abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "oauth_key": "oauth_bo4WXMIT...",
            "refresh_token": "refresh_abc124",
            "expires_in": "7200",
            "expires_at": "1498297390",
            "user_id": "594e0fa2838454002ea317a0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let user = User::by_id(&client, "594e0fa2838454002ea317a0")
        .await
        .unwrap();
    let key = user.authenticate().await.unwrap();

    assert_eq!(key.expose_key(), "oauth_bo4WXMIT...");
    assert_eq!(key.refresh_token, "refresh_abc124");
}

#[tokio::test]
async fn test_missing_required_field_is_malformed_response() {
    let server = MockServer::start().await;

    let mut body = user_body();
    body.as_object_mut().unwrap().remove("refresh_token");
    Mock::given(method("GET"))
        .and(path("/users/594e0fa2838454002ea317a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let error = User::by_id(&client, "594e0fa2838454002ea317a0")
        .await
        .unwrap_err();

    assert!(matches!(error, SynapseError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_api_error_envelope_surfaces_as_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"en": "Object not found."},
            "error_code": "404",
            "http_code": "404",
            "success": false
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let error = User::by_id(&client, "nope").await.unwrap_err();

    match error {
        SynapseError::Api(api_error) => {
            assert!(api_error.is_not_found());
            assert_eq!(api_error.message, "Object not found.");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
