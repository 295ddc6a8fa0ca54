//! SAML AuthnRequest types.
//!
//! Authentication request message sent by the service provider to the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, NameIdPolicy, SamlBinding, SAMLP_NS, SAML_NS};
use crate::xml::{escape_attr, escape_text};

/// SAML Authentication Request.
///
/// One is created per login attempt. The caller keeps [`id`](Self::id) to
/// correlate the response; the request itself is serialized once and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique, unguessable identifier for this request.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// IdP single sign-on URL the request is sent to.
    pub destination: String,

    /// The entity ID of the service provider issuing the request.
    pub issuer: String,

    /// The URL where the response should be sent.
    pub assertion_consumer_service_url: String,

    /// Binding the IdP should use for the response.
    pub protocol_binding: SamlBinding,

    /// Whether the IdP must authenticate the user directly.
    #[serde(default)]
    pub force_authn: bool,

    /// Whether the IdP must not interact with the user.
    #[serde(default)]
    pub is_passive: bool,

    /// Name ID policy constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_policy: Option<NameIdPolicy>,
}

impl AuthnRequest {
    /// Serializes the request document.
    ///
    /// The output always has the same shape so that signatures computed over
    /// it stay stable.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut flags = String::new();
        if self.force_authn {
            flags.push_str(" ForceAuthn=\"true\"");
        }
        if self.is_passive {
            flags.push_str(" IsPassive=\"true\"");
        }

        let policy = self
            .name_id_policy
            .as_ref()
            .map(NameIdPolicy::to_xml)
            .unwrap_or_default();

        format!(
            "<samlp:AuthnRequest xmlns:samlp=\"{SAMLP_NS}\" xmlns:saml=\"{SAML_NS}\" \
             ID=\"{id}\" Version=\"2.0\" IssueInstant=\"{instant}\" Destination=\"{destination}\"{flags} \
             ProtocolBinding=\"{binding}\" AssertionConsumerServiceURL=\"{acs}\">\
             <saml:Issuer>{issuer}</saml:Issuer>{policy}</samlp:AuthnRequest>",
            id = escape_attr(&self.id),
            instant = format_instant(&self.issue_instant),
            destination = escape_attr(&self.destination),
            binding = self.protocol_binding.uri(),
            acs = escape_attr(&self.assertion_consumer_service_url),
            issuer = escape_text(&self.issuer),
        )
    }
}
