use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synapse_api_client::SynapseRestClient;
use synapse_api_client::auth::StaticCredentials;
use synapse_api_client::models::{BankLoginResult, CreateNodeRequest, Node, NodeType, User};

const USER_ID: &str = "594e0fa2838454002ea317a0";
const NODE_ID: &str = "560adb4e86c27331bb5ac86e";

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

fn node_body(is_active: bool) -> serde_json::Value {
    json!({
        "_id": NODE_ID,
        "type": "ACH-US",
        "is_active": is_active,
        "user_id": USER_ID,
        "allowed": "CREDIT-AND-DEBIT",
        "info": {
            "nickname": "Primary Checking",
            "account_num": "8902",
            "routing_num": "0017",
            "type": "PERSONAL",
            "class": "CHECKING",
            "bank_long_name": "FAKE BANK",
            "balance": {"amount": 1000.02, "currency": "USD"}
        },
        "extra": {"supp_id": "node-supp-1"}
    })
}

async fn mount_user_and_oauth(server: &MockServer) -> User {
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
async fn test_create_ach_us_node() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/users/{USER_ID}/nodes")))
        .and(body_partial_json(json!({
            "type": "ACH-US",
            "info": {
                "nickname": "Primary Checking",
                "account_num": "72347235423",
                "routing_num": "051000017",
                "type": "PERSONAL",
                "class": "CHECKING"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": "0",
            "http_code": "200",
            "success": true,
            "nodes": [node_body(true)]
        })))
        .mount(&server)
        .await;

    let request = CreateNodeRequest::ach_us(
        "Primary Checking",
        "72347235423",
        "051000017",
        "PERSONAL",
        "CHECKING",
    );
    let node = Node::create(&user, &request).await.unwrap();

    assert_eq!(node.id, NODE_ID);
    assert_eq!(node.node_type, NodeType::AchUs);
    assert_eq!(node.nickname(), Some("Primary Checking"));
    assert_eq!(node.supp_id.as_deref(), Some("node-supp-1"));
    assert_eq!(
        node.info.balance.as_ref().unwrap().amount,
        Decimal::new(100_002, 2)
    );
}

#[tokio::test]
async fn test_node_by_id() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_body(true)))
        .mount(&server)
        .await;

    let node = Node::by_id(&user, NODE_ID).await.unwrap();

    assert_eq!(node.id, NODE_ID);
    assert!(node.is_active);
    assert_eq!(node.user.id, USER_ID);
}

#[tokio::test]
async fn test_all_nodes() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": "0",
            "http_code": "200",
            "success": true,
            "nodes": [node_body(true)]
        })))
        .mount(&server)
        .await;

    let nodes = Node::all(&user, None).await.unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node_type, NodeType::AchUs);
}

#[tokio::test]
async fn test_verify_microdeposits() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_body(false)))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}")))
        .and(body_partial_json(json!({"micro": [0.1, 0.1]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_body(true)))
        .mount(&server)
        .await;

    let node = Node::by_id(&user, NODE_ID).await.unwrap();
    let amounts = [Decimal::new(1, 1), Decimal::new(1, 1)];
    let verified = node.verify_microdeposits(&amounts).await.unwrap();

    assert!(verified.is_active);
    assert!(!node.is_active);
}

#[tokio::test]
async fn test_deactivate_node() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_body(true)))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/users/{USER_ID}/nodes/{NODE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_body(false)))
        .mount(&server)
        .await;

    let node = Node::by_id(&user, NODE_ID).await.unwrap();
    let deactivated = node.deactivate().await.unwrap();

    assert!(!deactivated.is_active);
}

#[tokio::test]
async fn test_bank_login_mfa_round_trip() {
    let server = MockServer::start().await;
    let user = mount_user_and_oauth(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/users/{USER_ID}/nodes")))
        .and(body_partial_json(json!({
            "type": "ACH-US",
            "info": {"bank_id": "synapse_good", "bank_pw": "test1234", "bank_name": "fake"}
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "error_code": "10",
            "http_code": "202",
            "success": true,
            "mfa": {
                "access_token": "fake_cd2182e5889a2c19c15c4",
                "message": "Enter the code we texted to your phone number."
            }
        })))
        .mount(&server)
        .await;

    let result = Node::create_via_bank_login(&user, "fake", "synapse_good", "test1234")
        .await
        .unwrap();
    let challenge = match result {
        BankLoginResult::Mfa(challenge) => challenge,
        BankLoginResult::Nodes(_) => panic!("expected an MFA challenge"),
    };
    assert_eq!(challenge.access_token, "fake_cd2182e5889a2c19c15c4");

    Mock::given(method("POST"))
        .and(path(format!("/users/{USER_ID}/nodes")))
        .and(body_partial_json(json!({
            "access_token": "fake_cd2182e5889a2c19c15c4",
            "mfa_answer": "test_answer"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": "0",
            "http_code": "200",
            "success": true,
            "nodes": [node_body(true)]
        })))
        .mount(&server)
        .await;

    let resumed = Node::answer_mfa(&user, &challenge.access_token, "test_answer")
        .await
        .unwrap();
    match resumed {
        BankLoginResult::Nodes(nodes) => {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].node_type, NodeType::AchUs);
        }
        BankLoginResult::Mfa(_) => panic!("expected linked nodes"),
    }
}
