//! Transactions moving funds between nodes.
//!
//! Transactions are nested under a node; every operation is node-scoped and
//! requires a fresh OAuth key for the owning user.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;

use crate::error::SynapseError;
use crate::models::node::{Node, NodeRef, NodeType};
use crate::rest::{SynapseRestClient, endpoints};

/// Processing status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Created but not yet queued.
    #[serde(rename = "CREATED")]
    Created,
    /// Queued by the platform.
    #[serde(rename = "QUEUED-BY-SYNAPSE")]
    QueuedBySynapse,
    /// Queued by the client platform (e.g. awaiting a processing date).
    #[serde(rename = "QUEUED-BY-CLIENT")]
    QueuedByClient,
    /// In flight.
    #[serde(rename = "PROCESSING")]
    Processing,
    /// Settled successfully.
    #[serde(rename = "SETTLED")]
    Settled,
    /// Canceled before settlement.
    #[serde(rename = "CANCELED")]
    Canceled,
    /// Returned after settlement was attempted.
    #[serde(rename = "RETURNED")]
    Returned,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Created => "CREATED",
            TransactionStatus::QueuedBySynapse => "QUEUED-BY-SYNAPSE",
            TransactionStatus::QueuedByClient => "QUEUED-BY-CLIENT",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Settled => "SETTLED",
            TransactionStatus::Canceled => "CANCELED",
            TransactionStatus::Returned => "RETURNED",
        };
        write!(f, "{}", s)
    }
}

/// One status event on a transaction's timeline.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEvent {
    /// Status entered at this event.
    pub status: TransactionStatus,
    /// Human-readable note attached to the event.
    #[serde(default)]
    pub note: Option<String>,
    /// When the event occurred.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub date: Option<OffsetDateTime>,
    /// Status id as reported by the API.
    #[serde(default)]
    pub status_id: Option<String>,
}

/// One side of a transaction (sender or receiver).
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEndpoint {
    /// Node id on this side, when reported.
    #[serde(default)]
    pub id: Option<String>,
    /// Node type on this side.
    #[serde(rename = "type", default)]
    pub node_type: Option<NodeType>,
    /// Node nickname on this side.
    #[serde(default)]
    pub nickname: Option<String>,
}

/// A fee attached to a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Fee {
    /// Fee amount (negative values credit the fee node).
    pub fee: Decimal,
    /// Note describing the fee.
    #[serde(default)]
    pub note: Option<String>,
    /// The node the fee is routed to.
    #[serde(default)]
    pub to: Option<FeeNode>,
}

/// Destination node of a fee.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeNode {
    /// Id of the fee node.
    pub id: String,
}

/// A transaction record.
#[derive(Debug, Clone)]
pub struct Transaction {
    client: SynapseRestClient,
    /// Handle to the node the transaction was created from.
    pub node: NodeRef,
    /// Id of the transaction.
    pub id: String,
    /// Transaction amount.
    pub amount: Decimal,
    /// ISO currency code of the amount.
    pub currency: String,
    /// Most recent status event.
    pub recent_status: TransactionEvent,
    /// Full status history, oldest first.
    pub timeline: Vec<TransactionEvent>,
    /// Sending side.
    pub from: TransactionEndpoint,
    /// Receiving side.
    pub to: TransactionEndpoint,
    /// Fees attached to the transaction.
    pub fees: Vec<Fee>,
    /// IP the transaction was created from.
    pub ip: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
    /// Supplemental id.
    pub supp_id: Option<String>,
    /// Whether same-day ACH processing was requested.
    pub same_day: Option<bool>,
    /// When the transaction was created.
    pub created_on: Option<OffsetDateTime>,
    /// When the transaction is scheduled to process.
    pub process_on: Option<OffsetDateTime>,
}

impl Transaction {
    /// Create a transaction from a node.
    pub async fn create(
        node: &Node,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction, SynapseError> {
        node.client()
            .refresh_oauth(&node.user.id, &node.user.refresh_token)
            .await?;
        let response: TransactionResponse = node
            .client()
            .post(&endpoints::transactions(&node.user.id, &node.id), request)
            .await?;
        Ok(Transaction::from_response(
            node.client(),
            &node.to_ref(),
            response,
        ))
    }

    /// Retrieve a transaction by id.
    pub async fn by_id(node: &Node, id: &str) -> Result<Transaction, SynapseError> {
        node.client()
            .refresh_oauth(&node.user.id, &node.user.refresh_token)
            .await?;
        let response: TransactionResponse = node
            .client()
            .get(&endpoints::transaction(&node.user.id, &node.id, id))
            .await?;
        Ok(Transaction::from_response(
            node.client(),
            &node.to_ref(),
            response,
        ))
    }

    /// Retrieve a node's transactions, limited by pagination.
    pub async fn all(
        node: &Node,
        query: Option<&TransactionQuery>,
    ) -> Result<Vec<Transaction>, SynapseError> {
        node.client()
            .refresh_oauth(&node.user.id, &node.user.refresh_token)
            .await?;
        let path = endpoints::transactions(&node.user.id, &node.id);
        let envelope: TransactionsEnvelope = match query {
            Some(q) => node.client().get_with_params(&path, q).await?,
            None => node.client().get(&path).await?,
        };
        let node_ref = node.to_ref();
        Ok(envelope
            .trans
            .into_iter()
            .map(|response| Transaction::from_response(node.client(), &node_ref, response))
            .collect())
    }

    /// Append a comment to the transaction's status note.
    pub async fn add_comment(&self, comment: &str) -> Result<Transaction, SynapseError> {
        self.client
            .refresh_oauth(&self.node.user.id, &self.node.user.refresh_token)
            .await?;
        let payload = CommentPayload {
            comment: comment.to_string(),
        };
        let response: TransactionResponse = self
            .client
            .patch(
                &endpoints::transaction(&self.node.user.id, &self.node.id, &self.id),
                &payload,
            )
            .await?;
        Ok(Transaction::from_response(&self.client, &self.node, response))
    }

    /// Cancel the transaction.
    ///
    /// Returns the transaction as reported by the server after
    /// cancellation.
    pub async fn cancel(&self) -> Result<Transaction, SynapseError> {
        self.client
            .refresh_oauth(&self.node.user.id, &self.node.user.refresh_token)
            .await?;
        let response: TransactionResponse = self
            .client
            .delete(&endpoints::transaction(
                &self.node.user.id,
                &self.node.id,
                &self.id,
            ))
            .await?;
        Ok(Transaction::from_response(&self.client, &self.node, response))
    }

    /// Current processing status.
    pub fn status(&self) -> TransactionStatus {
        self.recent_status.status
    }

    pub(crate) fn from_response(
        client: &SynapseRestClient,
        node: &NodeRef,
        response: TransactionResponse,
    ) -> Transaction {
        Transaction {
            client: client.clone(),
            node: node.clone(),
            id: response.id,
            amount: response.amount.amount,
            currency: response.amount.currency,
            recent_status: response.recent_status,
            timeline: response.timeline,
            from: response.from,
            to: response.to,
            fees: response.fees,
            ip: response.extra.ip,
            note: response.extra.note,
            supp_id: response.extra.supp_id,
            same_day: response.extra.same_day,
            created_on: response.extra.created_on,
            process_on: response.extra.process_on,
        }
    }
}

/// Request to create a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransactionRequest {
    to: ToPayload,
    amount: AmountPayload,
    extra: TransactionExtraPayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fees: Vec<FeePayload>,
}

impl CreateTransactionRequest {
    /// Create a request from the required fields.
    pub fn new(
        to_type: NodeType,
        to_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            to: ToPayload {
                node_type: to_type,
                id: to_id.into(),
            },
            amount: AmountPayload {
                amount,
                currency: currency.into(),
            },
            extra: TransactionExtraPayload {
                ip: ip.into(),
                note: None,
                supp_id: None,
                same_day: None,
                process_on: None,
            },
            fees: Vec::new(),
        }
    }

    /// Attach a free-form note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.extra.note = Some(note.into());
        self
    }

    /// Attach a supplemental id.
    pub fn supp_id(mut self, supp_id: impl Into<String>) -> Self {
        self.extra.supp_id = Some(supp_id.into());
        self
    }

    /// Request same-day ACH processing.
    pub fn same_day(mut self, same_day: bool) -> Self {
        self.extra.same_day = Some(same_day);
        self
    }

    /// Defer processing by the given number of days.
    pub fn process_in_days(mut self, days: u32) -> Self {
        self.extra.process_on = Some(days);
        self
    }

    /// Attach a fee routed to the given node.
    pub fn fee(
        mut self,
        fee: Decimal,
        note: impl Into<String>,
        to_node_id: impl Into<String>,
    ) -> Self {
        self.fees.push(FeePayload {
            fee,
            note: Some(note.into()),
            to: FeeNodePayload {
                id: to_node_id.into(),
            },
        });
        self
    }
}

/// Pagination for [`Transaction::all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionQuery {
    /// Page number to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of records per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct ToPayload {
    #[serde(rename = "type")]
    node_type: NodeType,
    id: String,
}

#[derive(Debug, Clone, Serialize)]
struct AmountPayload {
    amount: Decimal,
    currency: String,
}

#[derive(Debug, Clone, Serialize)]
struct TransactionExtraPayload {
    ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    same_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_on: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct FeePayload {
    fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    to: FeeNodePayload,
}

#[derive(Debug, Clone, Serialize)]
struct FeeNodePayload {
    id: String,
}

#[derive(Debug, Serialize)]
struct CommentPayload {
    comment: String,
}

/// Wire representation of a transaction record.
#[derive(Debug, Deserialize)]
pub(crate) struct TransactionResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) amount: AmountResponse,
    pub(crate) recent_status: TransactionEvent,
    pub(crate) from: TransactionEndpoint,
    pub(crate) to: TransactionEndpoint,
    #[serde(default)]
    pub(crate) timeline: Vec<TransactionEvent>,
    #[serde(default)]
    pub(crate) fees: Vec<Fee>,
    #[serde(default)]
    pub(crate) extra: TransactionExtraResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AmountResponse {
    pub(crate) amount: Decimal,
    pub(crate) currency: String,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransactionExtraResponse {
    #[serde(default)]
    pub(crate) ip: Option<String>,
    #[serde(default)]
    pub(crate) note: Option<String>,
    #[serde(default)]
    pub(crate) supp_id: Option<String>,
    #[serde(default)]
    pub(crate) same_day: Option<bool>,
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub(crate) created_on: Option<OffsetDateTime>,
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub(crate) process_on: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct TransactionsEnvelope {
    trans: Vec<TransactionResponse>,
}
