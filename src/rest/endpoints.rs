//! Synapse REST API endpoint constants and path builders.

/// Base URL for the production Synapse REST API.
pub const PRODUCTION_BASE_URL: &str = "https://api.synapsepay.com/api/3";

/// Base URL for the sandbox (UAT) Synapse REST API.
pub const SANDBOX_BASE_URL: &str = "https://uat-api.synapsepay.com/api/3";

/// User collection (create, paginated listing).
pub const USERS: &str = "/users";

/// A single user record.
pub fn user(user_id: &str) -> String {
    format!("/users/{user_id}")
}

/// OAuth refresh endpoint for a user.
pub fn oauth(user_id: &str) -> String {
    format!("/oauth/{user_id}")
}

/// Node collection under a user.
pub fn nodes(user_id: &str) -> String {
    format!("/users/{user_id}/nodes")
}

/// A single node under a user.
pub fn node(user_id: &str, node_id: &str) -> String {
    format!("/users/{user_id}/nodes/{node_id}")
}

/// Transaction collection under a node.
pub fn transactions(user_id: &str, node_id: &str) -> String {
    format!("/users/{user_id}/nodes/{node_id}/trans")
}

/// A single transaction under a node.
pub fn transaction(user_id: &str, node_id: &str, transaction_id: &str) -> String {
    format!("/users/{user_id}/nodes/{node_id}/trans/{transaction_id}")
}

/// Statements scoped to a user.
pub fn user_statements(user_id: &str) -> String {
    format!("/users/{user_id}/statements")
}

/// Statements scoped to a single node.
pub fn node_statements(user_id: &str, node_id: &str) -> String {
    format!("/users/{user_id}/nodes/{node_id}/statements")
}
