//! Monthly statements for users and nodes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;

use crate::error::SynapseError;
use crate::models::user::User;
use crate::rest::endpoints;

/// A read-only statement record.
///
/// Statements are generated server-side; every field is required and there
/// are no mutating operations.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    /// Id of the statement.
    #[serde(rename = "_id")]
    pub id: String,
    /// Id of the platform the statement was generated for.
    pub client_id: String,
    /// Id of the user the statement covers.
    pub user_id: String,
    /// Id of the node the statement covers.
    pub node_id: String,
    /// Start of the statement period.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub date_start: OffsetDateTime,
    /// End of the statement period.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub date_end: OffsetDateTime,
    /// Balance at the start of the period.
    pub opening_balance: Decimal,
    /// Balance at the end of the period.
    pub ending_balance: Decimal,
    /// Whether the statement is active.
    pub is_active: bool,
    /// Generation status reported by the API.
    pub status: String,
    /// Link to the generated CSV document.
    pub csv_url: String,
    /// Link to the generated JSON document.
    pub json_url: String,
    /// Link to the generated PDF document.
    pub pdf_url: String,
}

impl Statement {
    /// Retrieve statements for a user, or for one of the user's nodes.
    pub async fn retrieve(
        user: &User,
        node_id: Option<&str>,
    ) -> Result<Vec<Statement>, SynapseError> {
        Self::retrieve_with_query(user, node_id, None).await
    }

    /// Retrieve statements with explicit pagination.
    pub async fn retrieve_with_query(
        user: &User,
        node_id: Option<&str>,
        query: Option<&StatementQuery>,
    ) -> Result<Vec<Statement>, SynapseError> {
        user.authenticate().await?;
        let path = match node_id {
            Some(node_id) => endpoints::node_statements(&user.id, node_id),
            None => endpoints::user_statements(&user.id),
        };
        let envelope: StatementsEnvelope = match query {
            Some(q) => user.client().get_with_params(&path, q).await?,
            None => user.client().get(&path).await?,
        };
        Ok(envelope.statements)
    }
}

/// Pagination for [`Statement::retrieve_with_query`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatementQuery {
    /// Page number to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of records per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatementsEnvelope {
    statements: Vec<Statement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement_body() -> serde_json::Value {
        json!({
            "_id": "5a2a1d4d8a233a002e69d1b6",
            "client_id": "599378ec6aef1b0021026ea8",
            "user_id": "5a271c2592571b0034c0d9d8",
            "node_id": "5a399beece31670034632427",
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

    #[test]
    fn test_statement_deserializes() {
        let statement: Statement = serde_json::from_value(statement_body()).unwrap();
        assert_eq!(statement.id, "5a2a1d4d8a233a002e69d1b6");
        assert_eq!(statement.opening_balance, Decimal::new(100_023, 2));
        assert_eq!(statement.ending_balance, Decimal::new(110_075, 2));
        assert_eq!(statement.date_start.unix_timestamp(), 1_512_086_400);
        assert!(statement.is_active);
    }

    #[test]
    fn test_statement_missing_required_field_fails() {
        let mut body = statement_body();
        body.as_object_mut().unwrap().remove("ending_balance");
        let result: Result<Statement, _> = serde_json::from_value(body);
        assert!(result.is_err());
    }
}
