//! Bank and ledger nodes attached to a user.
//!
//! A node is an endpoint funds can move to or from: a linked US bank
//! account, a wire destination, or a platform-internal ledger. Node
//! creation and retrieval are user-scoped and require a fresh OAuth key.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SynapseError;
use crate::models::user::{User, UserRef};
use crate::rest::{SynapseRestClient, endpoints};

/// The node types this client can create and parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// US bank account reached over ACH.
    #[serde(rename = "ACH-US")]
    AchUs,
    /// Platform-internal US ledger node.
    #[serde(rename = "SYNAPSE-US")]
    SynapseUs,
    /// Domestic wire destination.
    #[serde(rename = "WIRE-US")]
    WireUs,
    /// International wire destination.
    #[serde(rename = "WIRE-INT")]
    WireInt,
    /// IOU ledger node denominated in an arbitrary currency.
    #[serde(rename = "IOU")]
    Iou,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::AchUs => "ACH-US",
            NodeType::SynapseUs => "SYNAPSE-US",
            NodeType::WireUs => "WIRE-US",
            NodeType::WireInt => "WIRE-INT",
            NodeType::Iou => "IOU",
        };
        write!(f, "{}", s)
    }
}

/// Non-owning navigational handle to a node, held by child resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Id of the node.
    pub id: String,
    /// Handle to the user the node belongs to.
    pub user: UserRef,
}

/// Type-specific details of a node.
///
/// Which fields are populated depends on the node type; everything is
/// optional and read defensively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInfo {
    /// Display nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Name on the underlying account.
    #[serde(default)]
    pub name_on_account: Option<String>,
    /// Account number (usually masked in responses).
    #[serde(default)]
    pub account_num: Option<String>,
    /// ABA routing number.
    #[serde(default)]
    pub routing_num: Option<String>,
    /// Bank name.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// Full bank name as resolved by the platform.
    #[serde(default)]
    pub bank_long_name: Option<String>,
    /// SWIFT/BIC code for international wires.
    #[serde(default)]
    pub swift: Option<String>,
    /// Account holder address.
    #[serde(default)]
    pub address: Option<String>,
    /// Account type, e.g. "PERSONAL" or "BUSINESS".
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    /// Account class, e.g. "CHECKING".
    #[serde(rename = "class", default)]
    pub account_class: Option<String>,
    /// Current balance, for node types that carry one.
    #[serde(default)]
    pub balance: Option<NodeBalance>,
}

/// Balance carried by ledger-type nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeBalance {
    /// Balance amount.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
}

/// A node record.
#[derive(Debug, Clone)]
pub struct Node {
    client: SynapseRestClient,
    /// Handle to the owning user.
    pub user: UserRef,
    /// Id of the node.
    pub id: String,
    /// Type of the node.
    pub node_type: NodeType,
    /// Whether the node is active.
    pub is_active: bool,
    /// Permitted directions ("CREDIT", "DEBIT", ...), as reported.
    pub allowed: Option<String>,
    /// Supplemental id from the extra bag.
    pub supp_id: Option<String>,
    /// Type-specific details.
    pub info: NodeInfo,
}

impl Node {
    /// Create a node under a user.
    pub async fn create(user: &User, request: &CreateNodeRequest) -> Result<Node, SynapseError> {
        user.authenticate().await?;
        let envelope: NodesEnvelope = user
            .client()
            .post(&endpoints::nodes(&user.id), request)
            .await?;
        let user_ref = user.to_ref();
        envelope
            .nodes
            .into_iter()
            .next()
            .map(|response| Node::from_response(user.client(), &user_ref, response))
            .ok_or_else(|| {
                SynapseError::MalformedResponse(
                    "node creation returned an empty nodes array".to_string(),
                )
            })
    }

    /// Link US bank accounts by logging into online banking.
    ///
    /// Depending on the bank this either returns the created nodes
    /// directly or an MFA challenge to answer via [`Node::answer_mfa`].
    pub async fn create_via_bank_login(
        user: &User,
        bank_name: &str,
        bank_id: &str,
        bank_pw: &str,
    ) -> Result<BankLoginResult, SynapseError> {
        user.authenticate().await?;
        let payload = BankLoginPayload {
            node_type: NodeType::AchUs,
            info: BankLoginInfo {
                bank_id: bank_id.to_string(),
                bank_pw: bank_pw.to_string(),
                bank_name: bank_name.to_string(),
            },
        };
        let envelope: BankLoginEnvelope = user
            .client()
            .post(&endpoints::nodes(&user.id), &payload)
            .await?;
        BankLoginResult::from_envelope(user.client(), &user.to_ref(), envelope)
    }

    /// Answer a pending bank login MFA challenge.
    ///
    /// Banks may chain several challenges; the result can be another
    /// [`BankLoginResult::Mfa`].
    pub async fn answer_mfa(
        user: &User,
        access_token: &str,
        answer: &str,
    ) -> Result<BankLoginResult, SynapseError> {
        user.authenticate().await?;
        let payload = MfaAnswerPayload {
            access_token: access_token.to_string(),
            mfa_answer: answer.to_string(),
        };
        let envelope: BankLoginEnvelope = user
            .client()
            .post(&endpoints::nodes(&user.id), &payload)
            .await?;
        BankLoginResult::from_envelope(user.client(), &user.to_ref(), envelope)
    }

    /// Retrieve a node by id.
    pub async fn by_id(user: &User, id: &str) -> Result<Node, SynapseError> {
        user.authenticate().await?;
        let response: NodeResponse = user
            .client()
            .get(&endpoints::node(&user.id, id))
            .await?;
        Ok(Node::from_response(user.client(), &user.to_ref(), response))
    }

    /// Retrieve a user's nodes, limited by pagination.
    pub async fn all(user: &User, query: Option<&NodeQuery>) -> Result<Vec<Node>, SynapseError> {
        user.authenticate().await?;
        let path = endpoints::nodes(&user.id);
        let envelope: NodesEnvelope = match query {
            Some(q) => user.client().get_with_params(&path, q).await?,
            None => user.client().get(&path).await?,
        };
        let user_ref = user.to_ref();
        Ok(envelope
            .nodes
            .into_iter()
            .map(|response| Node::from_response(user.client(), &user_ref, response))
            .collect())
    }

    /// Verify the micro-deposit amounts sent to an ACH-US node.
    pub async fn verify_microdeposits(&self, amounts: &[Decimal]) -> Result<Node, SynapseError> {
        self.client
            .refresh_oauth(&self.user.id, &self.user.refresh_token)
            .await?;
        let payload = MicroDepositsPayload {
            micro: amounts.to_vec(),
        };
        let response: NodeResponse = self
            .client
            .patch(&endpoints::node(&self.user.id, &self.id), &payload)
            .await?;
        Ok(Node::from_response(&self.client, &self.user, response))
    }

    /// Deactivate the node.
    ///
    /// Returns the node as reported by the server after deactivation.
    pub async fn deactivate(&self) -> Result<Node, SynapseError> {
        self.client
            .refresh_oauth(&self.user.id, &self.user.refresh_token)
            .await?;
        let response: NodeResponse = self
            .client
            .delete(&endpoints::node(&self.user.id, &self.id))
            .await?;
        Ok(Node::from_response(&self.client, &self.user, response))
    }

    /// Display nickname, if the node carries one.
    pub fn nickname(&self) -> Option<&str> {
        self.info.nickname.as_deref()
    }

    /// Build a non-owning handle to this node for child resources.
    pub fn to_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id.clone(),
            user: self.user.clone(),
        }
    }

    pub(crate) fn client(&self) -> &SynapseRestClient {
        &self.client
    }

    pub(crate) fn from_response(
        client: &SynapseRestClient,
        user: &UserRef,
        response: NodeResponse,
    ) -> Node {
        Node {
            client: client.clone(),
            user: user.clone(),
            id: response.id,
            node_type: response.node_type,
            is_active: response.is_active,
            allowed: response.allowed,
            supp_id: response.extra.supp_id,
            info: response.info,
        }
    }
}

/// Outcome of a bank login node creation.
#[derive(Debug)]
pub enum BankLoginResult {
    /// The bank linked immediately; one node per discovered account.
    Nodes(Vec<Node>),
    /// The bank requires an MFA answer before linking.
    Mfa(MfaChallenge),
}

impl BankLoginResult {
    fn from_envelope(
        client: &SynapseRestClient,
        user: &UserRef,
        envelope: BankLoginEnvelope,
    ) -> Result<Self, SynapseError> {
        if let Some(mfa) = envelope.mfa {
            return Ok(BankLoginResult::Mfa(mfa));
        }
        match envelope.nodes {
            Some(nodes) => Ok(BankLoginResult::Nodes(
                nodes
                    .into_iter()
                    .map(|response| Node::from_response(client, user, response))
                    .collect(),
            )),
            None => Err(SynapseError::MalformedResponse(
                "bank login response carried neither nodes nor an MFA challenge".to_string(),
            )),
        }
    }
}

/// An MFA challenge issued during bank login.
#[derive(Debug, Clone, Deserialize)]
pub struct MfaChallenge {
    /// Token identifying the pending login; echo it back with the answer.
    pub access_token: String,
    /// The challenge question to present to the end user.
    pub message: String,
}

/// Request to create a node, built per node type.
#[derive(Debug, Clone, Serialize)]
pub struct CreateNodeRequest {
    #[serde(rename = "type")]
    node_type: NodeType,
    info: NodeInfoPayload,
    #[serde(skip_serializing_if = "NodeExtraPayload::is_empty")]
    extra: NodeExtraPayload,
}

impl CreateNodeRequest {
    /// Payload for an ACH-US node created from account and routing numbers.
    ///
    /// Nodes created this way must be verified with
    /// [`Node::verify_microdeposits`] before they can send funds.
    pub fn ach_us(
        nickname: impl Into<String>,
        account_number: impl Into<String>,
        routing_number: impl Into<String>,
        account_type: impl Into<String>,
        account_class: impl Into<String>,
    ) -> Self {
        Self {
            node_type: NodeType::AchUs,
            info: NodeInfoPayload {
                nickname: Some(nickname.into()),
                account_num: Some(account_number.into()),
                routing_num: Some(routing_number.into()),
                account_type: Some(account_type.into()),
                account_class: Some(account_class.into()),
                ..Default::default()
            },
            extra: NodeExtraPayload::default(),
        }
    }

    /// Payload for a platform-internal SYNAPSE-US ledger node.
    pub fn synapse_us(nickname: impl Into<String>) -> Self {
        Self {
            node_type: NodeType::SynapseUs,
            info: NodeInfoPayload {
                nickname: Some(nickname.into()),
                ..Default::default()
            },
            extra: NodeExtraPayload::default(),
        }
    }

    /// Payload for a domestic WIRE-US destination.
    pub fn wire_us(
        nickname: impl Into<String>,
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        name_on_account: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            node_type: NodeType::WireUs,
            info: NodeInfoPayload {
                nickname: Some(nickname.into()),
                bank_name: Some(bank_name.into()),
                account_num: Some(account_number.into()),
                name_on_account: Some(name_on_account.into()),
                address: Some(address.into()),
                ..Default::default()
            },
            extra: NodeExtraPayload::default(),
        }
    }

    /// Payload for an international WIRE-INT destination.
    pub fn wire_int(
        nickname: impl Into<String>,
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        swift: impl Into<String>,
        name_on_account: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        // TODO: confirm against the sandbox whether the API reads `swift`
        // from the generic info fields alone or wants a separate explicit
        // assignment when correspondent details are present.
        Self {
            node_type: NodeType::WireInt,
            info: NodeInfoPayload {
                nickname: Some(nickname.into()),
                bank_name: Some(bank_name.into()),
                account_num: Some(account_number.into()),
                swift: Some(swift.into()),
                name_on_account: Some(name_on_account.into()),
                address: Some(address.into()),
                ..Default::default()
            },
            extra: NodeExtraPayload::default(),
        }
    }

    /// Payload for an IOU ledger node in the given currency.
    pub fn iou(nickname: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            node_type: NodeType::Iou,
            info: NodeInfoPayload {
                nickname: Some(nickname.into()),
                currency: Some(currency.into()),
                ..Default::default()
            },
            extra: NodeExtraPayload::default(),
        }
    }

    /// Set the routing number (WIRE-US destinations at some banks need one).
    pub fn routing_number(mut self, routing_number: impl Into<String>) -> Self {
        self.info.routing_num = Some(routing_number.into());
        self
    }

    /// Attach a supplemental id to the node.
    pub fn supp_id(mut self, supp_id: impl Into<String>) -> Self {
        self.extra.supp_id = Some(supp_id.into());
        self
    }
}

/// Pagination and filtering for [`Node::all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeQuery {
    /// Page number to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of records per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Restrict to one node type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct NodeInfoPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_num: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    account_type: Option<String>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    account_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    swift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_on_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct NodeExtraPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    supp_id: Option<String>,
}

impl NodeExtraPayload {
    fn is_empty(&self) -> bool {
        self.supp_id.is_none()
    }
}

#[derive(Debug, Serialize)]
struct BankLoginPayload {
    #[serde(rename = "type")]
    node_type: NodeType,
    info: BankLoginInfo,
}

#[derive(Debug, Serialize)]
struct BankLoginInfo {
    bank_id: String,
    bank_pw: String,
    bank_name: String,
}

#[derive(Debug, Serialize)]
struct MfaAnswerPayload {
    access_token: String,
    mfa_answer: String,
}

#[derive(Debug, Serialize)]
struct MicroDepositsPayload {
    micro: Vec<Decimal>,
}

/// Wire representation of a node record.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) node_type: NodeType,
    pub(crate) is_active: bool,
    pub(crate) info: NodeInfo,
    #[serde(default)]
    pub(crate) allowed: Option<String>,
    #[serde(default)]
    pub(crate) extra: NodeExtraResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NodeExtraResponse {
    #[serde(default)]
    pub(crate) supp_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodesEnvelope {
    nodes: Vec<NodeResponse>,
}

/// Bank login responses either carry the created nodes or an MFA challenge.
#[derive(Debug, Deserialize)]
struct BankLoginEnvelope {
    #[serde(default)]
    nodes: Option<Vec<NodeResponse>>,
    #[serde(default)]
    mfa: Option<MfaChallenge>,
}
