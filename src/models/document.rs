//! KYC documents: base documents and their physical/social/virtual children.
//!
//! Documents live under a user and are created and updated by PATCHing the
//! owning user record; the API returns the full refreshed user, from which
//! the changed document is extracted by identity.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;

use crate::error::SynapseError;
use crate::models::user::{UserRef, UserResponse};
use crate::rest::{SynapseRestClient, endpoints};

/// Known document type tags.
///
/// The remote system adds kinds over time, so document types are open
/// strings; these are the values it documents today.
pub mod document_types {
    // Physical documents
    /// Government-issued photo id.
    pub const GOVT_ID: &str = "GOVT_ID";
    /// Selfie photo for id matching.
    pub const SELFIE: &str = "SELFIE";
    /// Utility bill or similar proof of address.
    pub const PROOF_OF_ADDRESS: &str = "PROOF_OF_ADDRESS";

    // Social documents
    /// Facebook profile URL.
    pub const FACEBOOK: &str = "FACEBOOK";
    /// LinkedIn profile URL.
    pub const LINKEDIN: &str = "LINKEDIN";
    /// Twitter profile URL.
    pub const TWITTER: &str = "TWITTER";
    /// Email verified by a 2FA round trip.
    pub const EMAIL_2FA: &str = "EMAIL_2FA";
    /// Phone number verified by a 2FA round trip.
    pub const PHONE_NUMBER_2FA: &str = "PHONE_NUMBER_2FA";
    /// Company or personal website.
    pub const WEBSITE: &str = "WEBSITE";

    // Virtual documents
    /// Social security number.
    pub const SSN: &str = "SSN";
    /// Passport number.
    pub const PASSPORT: &str = "PASSPORT";
    /// Driver's license number.
    pub const DRIVERS_LICENSE: &str = "DRIVERS_LICENSE";
    /// Other personal identification number.
    pub const PERSONAL_IDENTIFICATION: &str = "PERSONAL_IDENTIFICATION";
    /// Tax identification number.
    pub const TIN: &str = "TIN";
    /// DUNS business identifier.
    pub const DUNS: &str = "DUNS";
}

/// A KYC base document owned by a user.
#[derive(Debug, Clone)]
pub struct BaseDocument {
    client: SynapseRestClient,
    /// Handle to the owning user.
    pub user: UserRef,
    /// Id of the base document.
    pub id: String,
    /// Name on the document.
    pub name: String,
    /// Permission scope granted by this document's verification state.
    pub permission_scope: String,
    /// Physical sub-documents (photo uploads).
    pub physical_documents: Vec<PhysicalDocument>,
    /// Social sub-documents (profiles, verified contact points).
    pub social_documents: Vec<SocialDocument>,
    /// Virtual sub-documents (id numbers).
    pub virtual_documents: Vec<VirtualDocument>,
}

impl BaseDocument {
    /// Apply an update to this document and return the refreshed instance.
    ///
    /// The owning user is re-authenticated first, the user record is
    /// PATCHed, and this document is re-extracted by id from the response.
    pub async fn update(
        &self,
        request: &UpdateBaseDocumentRequest,
    ) -> Result<BaseDocument, SynapseError> {
        let payload = request.to_payload(&self.id);
        self.client
            .refresh_oauth(&self.user.id, &self.user.refresh_token)
            .await?;
        let response: UserResponse = self
            .client
            .patch(&endpoints::user(&self.user.id), &payload)
            .await?;
        self.find_in_user_response(response)
    }

    /// Attach a physical document (e.g. a photo id scan).
    ///
    /// `value` is a base64 data URI; see [`PhysicalDocument::encode_value`].
    pub async fn add_physical_document(
        &self,
        document_type: &str,
        value: &str,
    ) -> Result<PhysicalDocument, SynapseError> {
        let request = UpdateBaseDocumentRequest::new().physical_document(document_type, value);
        let updated = self.update(&request).await?;
        updated
            .physical_documents
            .into_iter()
            .rev()
            .find(|doc| doc.document_type == document_type)
            .ok_or_else(|| missing_sub_document("physical", document_type))
    }

    /// Attach a social document (e.g. a profile URL).
    pub async fn add_social_document(
        &self,
        document_type: &str,
        value: &str,
    ) -> Result<SocialDocument, SynapseError> {
        let request = UpdateBaseDocumentRequest::new().social_document(document_type, value);
        let updated = self.update(&request).await?;
        updated
            .social_documents
            .into_iter()
            .rev()
            .find(|doc| doc.document_type == document_type)
            .ok_or_else(|| missing_sub_document("social", document_type))
    }

    /// Attach a virtual document (e.g. an SSN).
    pub async fn add_virtual_document(
        &self,
        document_type: &str,
        value: &str,
    ) -> Result<VirtualDocument, SynapseError> {
        let request = UpdateBaseDocumentRequest::new().virtual_document(document_type, value);
        let updated = self.update(&request).await?;
        updated
            .virtual_documents
            .into_iter()
            .rev()
            .find(|doc| doc.document_type == document_type)
            .ok_or_else(|| missing_sub_document("virtual", document_type))
    }

    fn find_in_user_response(&self, response: UserResponse) -> Result<BaseDocument, SynapseError> {
        let user = UserRef {
            id: response.id,
            refresh_token: response.refresh_token,
        };
        response
            .documents
            .into_iter()
            .find(|doc| doc.id == self.id)
            .map(|doc| BaseDocument::from_response(&self.client, &user, doc))
            .ok_or_else(|| {
                SynapseError::MalformedResponse(format!(
                    "document {} absent from refreshed user",
                    self.id
                ))
            })
    }

    pub(crate) fn from_response(
        client: &SynapseRestClient,
        user: &UserRef,
        response: BaseDocumentResponse,
    ) -> BaseDocument {
        let id = response.id;
        let physical_documents = response
            .physical_docs
            .into_iter()
            .map(|doc| PhysicalDocument::from_response(doc, &id))
            .collect();
        let social_documents = response
            .social_docs
            .into_iter()
            .map(|doc| SocialDocument::from_response(doc, &id))
            .collect();
        let virtual_documents = response
            .virtual_docs
            .into_iter()
            .map(|doc| VirtualDocument::from_response(doc, &id))
            .collect();

        BaseDocument {
            client: client.clone(),
            user: user.clone(),
            id,
            name: response.name,
            permission_scope: response.permission_scope,
            physical_documents,
            social_documents,
            virtual_documents,
        }
    }
}

fn missing_sub_document(kind: &str, document_type: &str) -> SynapseError {
    SynapseError::MalformedResponse(format!(
        "{kind} document of type {document_type} absent after update"
    ))
}

/// A physical sub-document (photo upload) on a base document.
#[derive(Debug, Clone)]
pub struct PhysicalDocument {
    /// Id of the sub-document.
    pub id: String,
    /// Document type tag, e.g. [`document_types::GOVT_ID`].
    pub document_type: String,
    /// Verification status reported by the API.
    pub status: Option<String>,
    /// Last time the document changed server-side.
    pub last_updated: Option<OffsetDateTime>,
    /// Id of the owning base document, assigned by the parent.
    pub base_document_id: String,
}

impl PhysicalDocument {
    /// Build a base64 data URI for a physical document upload.
    pub fn encode_value(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
    }

    fn from_response(response: SubDocumentResponse, base_document_id: &str) -> Self {
        Self {
            id: response.id,
            document_type: response.document_type,
            status: response.status,
            last_updated: response.last_updated,
            base_document_id: base_document_id.to_string(),
        }
    }
}

/// A social sub-document (profile or verified contact point).
#[derive(Debug, Clone)]
pub struct SocialDocument {
    /// Id of the sub-document.
    pub id: String,
    /// Document type tag, e.g. [`document_types::FACEBOOK`].
    pub document_type: String,
    /// Verification status reported by the API.
    pub status: Option<String>,
    /// Last time the document changed server-side.
    pub last_updated: Option<OffsetDateTime>,
    /// Id of the owning base document, assigned by the parent.
    pub base_document_id: String,
}

impl SocialDocument {
    fn from_response(response: SubDocumentResponse, base_document_id: &str) -> Self {
        Self {
            id: response.id,
            document_type: response.document_type,
            status: response.status,
            last_updated: response.last_updated,
            base_document_id: base_document_id.to_string(),
        }
    }
}

/// A virtual sub-document (id number).
#[derive(Debug, Clone)]
pub struct VirtualDocument {
    /// Id of the sub-document.
    pub id: String,
    /// Document type tag, e.g. [`document_types::SSN`].
    pub document_type: String,
    /// Verification status reported by the API.
    pub status: Option<String>,
    /// Last time the document changed server-side.
    pub last_updated: Option<OffsetDateTime>,
    /// Id of the owning base document, assigned by the parent.
    pub base_document_id: String,
}

impl VirtualDocument {
    fn from_response(response: SubDocumentResponse, base_document_id: &str) -> Self {
        Self {
            id: response.id,
            document_type: response.document_type,
            status: response.status,
            last_updated: response.last_updated,
            base_document_id: base_document_id.to_string(),
        }
    }
}

/// Request to create a base document on a user.
///
/// All fields below are required by the API's KYC form; submitting the
/// request fails with [`SynapseError::MissingField`] naming the first
/// absent field.
#[derive(Debug, Clone, Default)]
pub struct CreateBaseDocumentRequest {
    email: Option<String>,
    phone_number: Option<String>,
    ip: Option<String>,
    name: Option<String>,
    alias: Option<String>,
    entity_type: Option<String>,
    entity_scope: Option<String>,
    birth_day: Option<u8>,
    birth_month: Option<u8>,
    birth_year: Option<u16>,
    address_street: Option<String>,
    address_city: Option<String>,
    address_subdivision: Option<String>,
    address_postal_code: Option<String>,
    address_country_code: Option<String>,
}

impl CreateBaseDocumentRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact email for the document holder.
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    /// Contact phone number for the document holder.
    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = Some(value.into());
        self
    }

    /// IP address the document was submitted from.
    pub fn ip(mut self, value: impl Into<String>) -> Self {
        self.ip = Some(value.into());
        self
    }

    /// Name on the document.
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Alias or DBA (use the name if there is no alias).
    pub fn alias(mut self, value: impl Into<String>) -> Self {
        self.alias = Some(value.into());
        self
    }

    /// Entity type, e.g. "M" or "LLC".
    pub fn entity_type(mut self, value: impl Into<String>) -> Self {
        self.entity_type = Some(value.into());
        self
    }

    /// Entity scope, e.g. "Arts & Entertainment".
    pub fn entity_scope(mut self, value: impl Into<String>) -> Self {
        self.entity_scope = Some(value.into());
        self
    }

    /// Day of birth.
    pub fn birth_day(mut self, value: u8) -> Self {
        self.birth_day = Some(value);
        self
    }

    /// Month of birth.
    pub fn birth_month(mut self, value: u8) -> Self {
        self.birth_month = Some(value);
        self
    }

    /// Year of birth.
    pub fn birth_year(mut self, value: u16) -> Self {
        self.birth_year = Some(value);
        self
    }

    /// Street address, as "123 Maple Street".
    pub fn address_street(mut self, value: impl Into<String>) -> Self {
        self.address_street = Some(value.into());
        self
    }

    /// Address city.
    pub fn address_city(mut self, value: impl Into<String>) -> Self {
        self.address_city = Some(value.into());
        self
    }

    /// State, province, or other subdivision.
    pub fn address_subdivision(mut self, value: impl Into<String>) -> Self {
        self.address_subdivision = Some(value.into());
        self
    }

    /// Postal code.
    pub fn address_postal_code(mut self, value: impl Into<String>) -> Self {
        self.address_postal_code = Some(value.into());
        self
    }

    /// Country code, as "US".
    pub fn address_country_code(mut self, value: impl Into<String>) -> Self {
        self.address_country_code = Some(value.into());
        self
    }

    pub(crate) fn to_payload(&self) -> Result<CreateDocumentsPayload, SynapseError> {
        fn required<T: Clone>(
            field: &'static str,
            value: &Option<T>,
        ) -> Result<T, SynapseError> {
            value.clone().ok_or(SynapseError::MissingField {
                resource: "base document",
                field,
            })
        }

        Ok(CreateDocumentsPayload {
            documents: vec![CreateDocumentFields {
                email: required("email", &self.email)?,
                phone_number: required("phone_number", &self.phone_number)?,
                ip: required("ip", &self.ip)?,
                name: required("name", &self.name)?,
                alias: required("alias", &self.alias)?,
                entity_type: required("entity_type", &self.entity_type)?,
                entity_scope: required("entity_scope", &self.entity_scope)?,
                day: required("birth_day", &self.birth_day)?,
                month: required("birth_month", &self.birth_month)?,
                year: required("birth_year", &self.birth_year)?,
                address_street: required("address_street", &self.address_street)?,
                address_city: required("address_city", &self.address_city)?,
                address_subdivision: required("address_subdivision", &self.address_subdivision)?,
                address_postal_code: required("address_postal_code", &self.address_postal_code)?,
                address_country_code: required(
                    "address_country_code",
                    &self.address_country_code,
                )?,
            }],
        })
    }
}

/// Request to update a base document.
///
/// Always carries the document id. The three sub-document kinds have their
/// own update keys because the API segments them into separate arrays;
/// anything else set via [`Self::field`] passes through verbatim for
/// API fields not yet modeled here.
#[derive(Debug, Clone, Default)]
pub struct UpdateBaseDocumentRequest {
    email: Option<String>,
    phone_number: Option<String>,
    ip: Option<String>,
    name: Option<String>,
    alias: Option<String>,
    entity_type: Option<String>,
    entity_scope: Option<String>,
    physical_documents: Vec<SubDocumentPayload>,
    social_documents: Vec<SubDocumentPayload>,
    virtual_documents: Vec<SubDocumentPayload>,
    extra_fields: BTreeMap<String, Value>,
}

impl UpdateBaseDocumentRequest {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the contact email.
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    /// Change the contact phone number.
    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = Some(value.into());
        self
    }

    /// Change the submission IP address.
    pub fn ip(mut self, value: impl Into<String>) -> Self {
        self.ip = Some(value.into());
        self
    }

    /// Change the name on the document.
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Change the alias.
    pub fn alias(mut self, value: impl Into<String>) -> Self {
        self.alias = Some(value.into());
        self
    }

    /// Change the entity type.
    pub fn entity_type(mut self, value: impl Into<String>) -> Self {
        self.entity_type = Some(value.into());
        self
    }

    /// Change the entity scope.
    pub fn entity_scope(mut self, value: impl Into<String>) -> Self {
        self.entity_scope = Some(value.into());
        self
    }

    /// Queue a physical document for submission.
    pub fn physical_document(
        mut self,
        document_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.physical_documents.push(SubDocumentPayload {
            document_type: document_type.into(),
            document_value: value.into(),
        });
        self
    }

    /// Queue a social document for submission.
    pub fn social_document(
        mut self,
        document_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.social_documents.push(SubDocumentPayload {
            document_type: document_type.into(),
            document_value: value.into(),
        });
        self
    }

    /// Queue a virtual document for submission.
    pub fn virtual_document(
        mut self,
        document_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.virtual_documents.push(SubDocumentPayload {
            document_type: document_type.into(),
            document_value: value.into(),
        });
        self
    }

    /// Pass an unmodeled key through verbatim into the document mapping.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    pub(crate) fn to_payload(&self, id: &str) -> UpdateDocumentsPayload {
        UpdateDocumentsPayload {
            documents: vec![UpdateDocumentFields {
                id: id.to_string(),
                email: self.email.clone(),
                phone_number: self.phone_number.clone(),
                ip: self.ip.clone(),
                name: self.name.clone(),
                alias: self.alias.clone(),
                entity_type: self.entity_type.clone(),
                entity_scope: self.entity_scope.clone(),
                physical_docs: self.physical_documents.clone(),
                social_docs: self.social_documents.clone(),
                virtual_docs: self.virtual_documents.clone(),
                extra_fields: self.extra_fields.clone(),
            }],
        }
    }
}

/// A sub-document entry as submitted to the API.
#[derive(Debug, Clone, Serialize)]
pub struct SubDocumentPayload {
    document_value: String,
    document_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDocumentsPayload {
    documents: Vec<CreateDocumentFields>,
}

#[derive(Debug, Serialize)]
struct CreateDocumentFields {
    email: String,
    phone_number: String,
    ip: String,
    name: String,
    alias: String,
    entity_type: String,
    entity_scope: String,
    day: u8,
    month: u8,
    year: u16,
    address_street: String,
    address_city: String,
    address_subdivision: String,
    address_postal_code: String,
    address_country_code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateDocumentsPayload {
    documents: Vec<UpdateDocumentFields>,
}

#[derive(Debug, Serialize)]
struct UpdateDocumentFields {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_scope: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    physical_docs: Vec<SubDocumentPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    social_docs: Vec<SubDocumentPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    virtual_docs: Vec<SubDocumentPayload>,
    #[serde(flatten)]
    extra_fields: BTreeMap<String, Value>,
}

/// Wire representation of a base document.
#[derive(Debug, Deserialize)]
pub(crate) struct BaseDocumentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) permission_scope: String,
    pub(crate) physical_docs: Vec<SubDocumentResponse>,
    pub(crate) social_docs: Vec<SubDocumentResponse>,
    pub(crate) virtual_docs: Vec<SubDocumentResponse>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct SubDocumentResponse {
    pub(crate) id: String,
    pub(crate) document_type: String,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub(crate) last_updated: Option<OffsetDateTime>,
}
