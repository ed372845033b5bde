//! Resource models mirroring the remote API objects.
//!
//! Every model follows the same lifecycle: built from an API response
//! (`from_response`) or by a remote-side-effecting `create`, and replaced
//! wholesale on mutation. The server is the sole source of truth; no field
//! is ever patched in place locally.

pub mod document;
pub mod node;
pub mod statement;
pub mod transaction;
pub mod user;

pub use document::{
    BaseDocument, CreateBaseDocumentRequest, PhysicalDocument, SocialDocument,
    SubDocumentPayload, UpdateBaseDocumentRequest, VirtualDocument, document_types,
};
pub use node::{
    BankLoginResult, CreateNodeRequest, MfaChallenge, Node, NodeBalance, NodeInfo, NodeQuery,
    NodeRef, NodeType,
};
pub use statement::{Statement, StatementQuery};
pub use transaction::{
    CreateTransactionRequest, Fee, FeeNode, Transaction, TransactionEndpoint, TransactionEvent,
    TransactionQuery, TransactionStatus,
};
pub use user::{CreateUserRequest, Login, Permission, User, UserQuery, UserRef};
