use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synapse_api_client::SynapseRestClient;
use synapse_api_client::auth::StaticCredentials;
use synapse_api_client::models::{Statement, StatementQuery, User};

const USER_ID: &str = "5a271c2592571b0034c0d9d8";
const NODE_ID: &str = "5a399beece31670034632427";

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

fn statement_body() -> serde_json::Value {
    json!({
        "_id": "5a2a1d4d8a233a002e69d1b6",
        "client_id": "599378ec6aef1b0021026ea8",
        "user_id": USER_ID,
        "node_id": NODE_ID,
        "date_start": 1512086400000i64,
        "date_end": 1514678400000i64,
        "opening_balance": 1000.23,
        "ending_balance": 1100.75,
        "is_active": true,
        "status": "FINISHED",
        "csv_url": "https://cdn.example.com/statement.csv",
        "json_url": "https://cdn.example.com/statement.json",
        "pdf_url": "https://cdn.example.com/statement.pdf"
    })
}

async fn fetch_user(server: &MockServer) -> User {
    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": USER_ID,
            "refresh_token": "refresh_abc123",
            "logins": [{"email": "a@b.com"}],
            "phone_numbers": ["901-111-1111"],
            "legal_names": ["Test User"],
            "permission": "SEND-AND-RECEIVE",
            "documents": []
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/oauth/{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "oauth_key": "oauth_bo4WXMIT",
            "refresh_token": "refresh_abc123"
        })))
        .mount(server)
        .await;

    let client = build_client(server);
    User::by_id(&client, USER_ID).await.unwrap()
}

#[tokio::test]
async fn test_statements_by_user() {
    let server = MockServer::start().await;
    let user = fetch_user(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/statements")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statements": [statement_body()],
            "statements_count": 1,
            "page": 1
        })))
        .mount(&server)
        .await;

    let statements = Statement::retrieve(&user, None).await.unwrap();

    assert_eq!(statements.len(), 1);
    let statement = &statements[0];
    assert_eq!(statement.id, "5a2a1d4d8a233a002e69d1b6");
    assert_eq!(statement.client_id, "599378ec6aef1b0021026ea8");
    assert_eq!(statement.user_id, USER_ID);
    assert_eq!(statement.node_id, NODE_ID);
    assert_eq!(statement.opening_balance, Decimal::new(100_023, 2));
    assert_eq!(statement.ending_balance, Decimal::new(110_075, 2));
    assert_eq!(statement.date_start.unix_timestamp(), 1_512_086_400);
    assert_eq!(statement.date_end.unix_timestamp(), 1_514_678_400);
    assert_eq!(statement.status, "FINISHED");
    assert!(statement.is_active);
    assert!(statement.csv_url.ends_with(".csv"));
    assert!(statement.json_url.ends_with(".json"));
    assert!(statement.pdf_url.ends_with(".pdf"));
}

#[tokio::test]
async fn test_statements_by_node() {
    let server = MockServer::start().await;
    let user = fetch_user(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}/statements")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statements": [statement_body()],
            "statements_count": 1,
            "page": 1
        })))
        .mount(&server)
        .await;

    let statements = Statement::retrieve(&user, Some(NODE_ID)).await.unwrap();

    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].node_id, NODE_ID);
}

#[tokio::test]
async fn test_statements_pagination_query() {
    let server = MockServer::start().await;
    let user = fetch_user(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/statements")))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statements": [],
            "statements_count": 0,
            "page": 2
        })))
        .mount(&server)
        .await;

    let query = StatementQuery {
        page: Some(2),
        per_page: Some(5),
    };
    let statements = Statement::retrieve_with_query(&user, None, Some(&query))
        .await
        .unwrap();

    assert!(statements.is_empty());
}
