//! SAML Logout types.
//!
//! SP-initiated Single Logout request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, NameId, SAMLP_NS, SAML_NS};
use crate::xml::{escape_attr, escape_text};

/// SAML Logout Request.
///
/// A request to terminate the session identified by `name_id` and, when
/// known, `session_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// IdP single logout URL.
    pub destination: String,

    /// The entity ID of the requester.
    pub issuer: String,

    /// The name identifier of the principal to log out.
    pub name_id: NameId,

    /// Session index to terminate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,
}

impl LogoutRequest {
    /// Serializes the request document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let session_index = self
            .session_index
            .as_deref()
            .map(|idx| format!("<samlp:SessionIndex>{}</samlp:SessionIndex>", escape_text(idx)))
            .unwrap_or_default();

        format!(
            "<samlp:LogoutRequest xmlns:samlp=\"{SAMLP_NS}\" xmlns:saml=\"{SAML_NS}\" \
             ID=\"{id}\" Version=\"2.0\" IssueInstant=\"{instant}\" Destination=\"{destination}\">\
             <saml:Issuer>{issuer}</saml:Issuer>{name_id}{session_index}</samlp:LogoutRequest>",
            id = escape_attr(&self.id),
            instant = format_instant(&self.issue_instant),
            destination = escape_attr(&self.destination),
            issuer = escape_text(&self.issuer),
            name_id = self.name_id.to_xml(),
        )
    }
}
