//! The user resource and its operations.
//!
//! A [`User`] mirrors one remote user record: identity, logins, legal names,
//! phone numbers, permission state, the free-form extra fields, and the KYC
//! base documents nested under it. Instances are only ever built from API
//! responses; mutating operations return a brand-new instance rebuilt from
//! the server's response and leave the receiver untouched.

use serde::{Deserialize, Serialize};

use crate::auth::OauthKey;
use crate::error::SynapseError;
use crate::models::document::{
    BaseDocument, BaseDocumentResponse, CreateBaseDocumentRequest,
};
use crate::rest::{SynapseRestClient, endpoints};

/// Permission state of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// No KYC documents verified yet.
    #[serde(rename = "UNVERIFIED")]
    Unverified,
    /// May receive funds but not send them.
    #[serde(rename = "RECEIVE")]
    Receive,
    /// Fully verified.
    #[serde(rename = "SEND-AND-RECEIVE")]
    SendAndReceive,
    /// Temporarily locked by the platform.
    #[serde(rename = "LOCKED")]
    Locked,
    /// Closed by the user or the platform.
    #[serde(rename = "CLOSED")]
    Closed,
    /// Permanently removed.
    #[serde(rename = "MAKE-IT-GO-AWAY")]
    MakeItGoAway,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Permission::Unverified => "UNVERIFIED",
            Permission::Receive => "RECEIVE",
            Permission::SendAndReceive => "SEND-AND-RECEIVE",
            Permission::Locked => "LOCKED",
            Permission::Closed => "CLOSED",
            Permission::MakeItGoAway => "MAKE-IT-GO-AWAY",
        };
        write!(f, "{}", s)
    }
}

/// A login entry on a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    /// Login email address.
    pub email: String,
    /// Access scope granted to this login, as reported by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Non-owning navigational handle to a user, held by child resources.
///
/// Children never own their parent; they keep the identity and refresh token
/// needed to re-authenticate and address user-scoped endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Id of the user.
    pub id: String,
    /// Refresh token used for OAuth exchanges on the user's behalf.
    pub refresh_token: String,
}

/// A user record.
#[derive(Debug, Clone)]
pub struct User {
    client: SynapseRestClient,
    /// Id of the user record.
    pub id: String,
    /// Refresh token for OAuth exchanges.
    pub refresh_token: String,
    /// Login emails registered on the record.
    pub logins: Vec<Login>,
    /// Phone numbers registered on the record.
    pub phone_numbers: Vec<String>,
    /// Legal names registered on the record.
    pub legal_names: Vec<String>,
    /// Current permission state.
    pub permission: Permission,
    /// Free-form note from the extra bag.
    pub note: Option<String>,
    /// Supplemental id from the extra bag.
    pub supp_id: Option<String>,
    /// Whether this is a business user.
    pub is_business: Option<bool>,
    /// CIP tag assigned by the platform's CIP flow.
    pub cip_tag: Option<u32>,
    /// KYC base documents owned by the user.
    pub base_documents: Vec<BaseDocument>,
}

impl User {
    /// Create a user record and a corresponding instance.
    pub async fn create(
        client: &SynapseRestClient,
        request: &CreateUserRequest,
    ) -> Result<User, SynapseError> {
        let response: UserResponse = client.post(endpoints::USERS, request).await?;
        Ok(User::from_response(client, response))
    }

    /// Retrieve a user record by id.
    pub async fn by_id(client: &SynapseRestClient, id: &str) -> Result<User, SynapseError> {
        let response: UserResponse = client.get(&endpoints::user(id)).await?;
        Ok(User::from_response(client, response))
    }

    /// Retrieve user records, limited by pagination.
    pub async fn all(
        client: &SynapseRestClient,
        query: Option<&UserQuery>,
    ) -> Result<Vec<User>, SynapseError> {
        let envelope: UsersEnvelope = match query {
            Some(q) => client.get_with_params(endpoints::USERS, q).await?,
            None => client.get(endpoints::USERS).await?,
        };
        Ok(envelope
            .users
            .into_iter()
            .map(|response| User::from_response(client, response))
            .collect())
    }

    /// Refresh the user's OAuth token.
    ///
    /// The refreshed key is stored in the client's shared session and also
    /// returned.
    pub async fn authenticate(&self) -> Result<OauthKey, SynapseError> {
        self.client
            .refresh_oauth(&self.id, &self.refresh_token)
            .await
    }

    /// Add an additional legal name to the user.
    pub async fn add_legal_name(&self, name: &str) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            legal_name: Some(name.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Add an additional login email (and optional portal password) to the user.
    pub async fn add_login(
        &self,
        email: &str,
        password: Option<&str>,
        read_only: Option<bool>,
    ) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            login: Some(LoginPayload {
                email: email.to_string(),
                password: password.map(str::to_string),
                read_only,
            }),
            ..Default::default()
        })
        .await
    }

    /// Remove a login email from the user.
    pub async fn remove_login(&self, email: &str) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            remove_login: Some(RemoveLoginPayload {
                email: email.to_string(),
            }),
            ..Default::default()
        })
        .await
    }

    /// Add a phone number to the user.
    pub async fn add_phone_number(&self, phone_number: &str) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            phone_number: Some(phone_number.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Remove a phone number from the user.
    pub async fn remove_phone_number(&self, phone_number: &str) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            remove_phone_number: Some(phone_number.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Change the user's CIP tag.
    pub async fn change_cip_tag(&self, cip_tag: u32) -> Result<User, SynapseError> {
        self.update(UserUpdateFields {
            cip_tag: Some(cip_tag),
            ..Default::default()
        })
        .await
    }

    /// Add a KYC base document to the user.
    ///
    /// Returns the newly created [`BaseDocument`], extracted from the
    /// refreshed user representation.
    pub async fn add_base_document(
        &self,
        request: &CreateBaseDocumentRequest,
    ) -> Result<BaseDocument, SynapseError> {
        let payload = request.to_payload()?;
        self.authenticate().await?;
        let response: UserResponse = self
            .client
            .patch(&endpoints::user(&self.id), &payload)
            .await?;
        let user = User::from_response(&self.client, response);
        user.base_documents.into_iter().next_back().ok_or_else(|| {
            SynapseError::MalformedResponse(
                "user has no documents after base document creation".to_string(),
            )
        })
    }

    /// Build a non-owning handle to this user for child resources.
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    pub(crate) fn client(&self) -> &SynapseRestClient {
        &self.client
    }

    /// Issue an update PATCH and rebuild the user from the response.
    async fn update(&self, fields: UserUpdateFields) -> Result<User, SynapseError> {
        let payload = self.update_payload(fields);
        let response: UserResponse = self
            .client
            .patch(&endpoints::user(&self.id), &payload)
            .await?;
        Ok(User::from_response(&self.client, response))
    }

    /// Every update payload carries the refresh token and the `update`
    /// wrapper the API uses to distinguish patches from creates.
    fn update_payload(&self, fields: UserUpdateFields) -> UpdateUserRequest {
        UpdateUserRequest {
            refresh_token: self.refresh_token.clone(),
            update: fields,
        }
    }

    pub(crate) fn from_response(client: &SynapseRestClient, response: UserResponse) -> User {
        let user_ref = UserRef {
            id: response.id.clone(),
            refresh_token: response.refresh_token.clone(),
        };
        let base_documents = response
            .documents
            .into_iter()
            .map(|doc| BaseDocument::from_response(client, &user_ref, doc))
            .collect();

        User {
            client: client.clone(),
            id: response.id,
            refresh_token: response.refresh_token,
            logins: response.logins,
            phone_numbers: response.phone_numbers,
            legal_names: response.legal_names,
            permission: response.permission,
            note: response.extra.note,
            supp_id: response.extra.supp_id,
            is_business: response.extra.is_business,
            cip_tag: response.extra.cip_tag,
            base_documents,
        }
    }
}

/// Request to create a user record.
///
/// Required fields are constructor parameters; the recognized optional
/// fields land in the record's extra bag only when supplied.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    logins: Vec<LoginPayload>,
    phone_numbers: Vec<String>,
    legal_names: Vec<String>,
    #[serde(skip_serializing_if = "UserExtraPayload::is_empty")]
    extra: UserExtraPayload,
}

impl CreateUserRequest {
    /// Create a request from the required fields.
    pub fn new(
        email: impl Into<String>,
        phone_number: impl Into<String>,
        legal_name: impl Into<String>,
    ) -> Self {
        Self {
            logins: vec![LoginPayload {
                email: email.into(),
                password: None,
                read_only: None,
            }],
            phone_numbers: vec![phone_number.into()],
            legal_names: vec![legal_name.into()],
            extra: UserExtraPayload::default(),
        }
    }

    /// Set a portal password on the login (only for users who log in via web).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.logins[0].password = Some(password.into());
        self
    }

    /// Mark the login as read-only (non-admin).
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.logins[0].read_only = Some(read_only);
        self
    }

    /// Attach a free-form note to the record.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.extra.note = Some(note.into());
        self
    }

    /// Attach a supplemental id to the record.
    pub fn supp_id(mut self, supp_id: impl Into<String>) -> Self {
        self.extra.supp_id = Some(supp_id.into());
        self
    }

    /// Mark the record as a business user.
    pub fn is_business(mut self, is_business: bool) -> Self {
        self.extra.is_business = Some(is_business);
        self
    }

    /// Set the CIP tag determined by the platform's CIP flow.
    pub fn cip_tag(mut self, cip_tag: u32) -> Self {
        self.extra.cip_tag = Some(cip_tag);
        self
    }
}

/// Pagination and filtering for [`User::all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserQuery {
    /// Page number to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of records per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Substring to filter for in user names and emails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct LoginPayload {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_only: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct UserExtraPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_business: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cip_tag: Option<u32>,
}

impl UserExtraPayload {
    fn is_empty(&self) -> bool {
        self.note.is_none()
            && self.supp_id.is_none()
            && self.is_business.is_none()
            && self.cip_tag.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
struct UpdateUserRequest {
    refresh_token: String,
    update: UserUpdateFields,
}

#[derive(Debug, Clone, Default, Serialize)]
struct UserUpdateFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<LoginPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove_login: Option<RemoveLoginPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cip_tag: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct RemoveLoginPayload {
    email: String,
}

/// Wire representation of a user record.
#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) refresh_token: String,
    pub(crate) logins: Vec<Login>,
    pub(crate) phone_numbers: Vec<String>,
    pub(crate) legal_names: Vec<String>,
    pub(crate) permission: Permission,
    pub(crate) documents: Vec<BaseDocumentResponse>,
    // The whole extra mapping may be absent; its fields must still read.
    #[serde(default)]
    pub(crate) extra: UserExtraResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserExtraResponse {
    #[serde(default)]
    pub(crate) note: Option<String>,
    #[serde(default)]
    pub(crate) supp_id: Option<String>,
    #[serde(default)]
    pub(crate) is_business: Option<bool>,
    #[serde(default)]
    pub(crate) cip_tag: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    users: Vec<UserResponse>,
}
