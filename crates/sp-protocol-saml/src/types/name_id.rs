//! SAML Name ID types.
//!
//! Name identifiers are used to identify subjects in SAML assertions.

use serde::{Deserialize, Serialize};

use super::NameIdFormat;
use crate::xml::{escape_attr, escape_text};

/// SAML Name ID.
///
/// Represents the identifier of a subject in a SAML assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format URI of the name identifier, as sent by the IdP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }

    /// Returns the format as a known enumeration value, if recognised.
    #[must_use]
    pub fn known_format(&self) -> Option<NameIdFormat> {
        self.format.as_deref().and_then(NameIdFormat::from_uri)
    }

    /// Serializes as a `saml:NameID` element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut attrs = String::new();
        for (name, value) in [
            ("Format", &self.format),
            ("NameQualifier", &self.name_qualifier),
            ("SPNameQualifier", &self.sp_name_qualifier),
        ] {
            if let Some(value) = value {
                attrs.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
            }
        }
        format!(
            "<saml:NameID{attrs}>{}</saml:NameID>",
            escape_text(&self.value)
        )
    }
}

/// Name ID policy carried in an `AuthnRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameIdPolicy {
    /// Requested name ID format.
    pub format: NameIdFormat,

    /// Whether the IdP may create a new identifier for the principal.
    pub allow_create: bool,
}

impl NameIdPolicy {
    /// Policy requesting `format` with identifier creation allowed.
    #[must_use]
    pub const fn allow_create(format: NameIdFormat) -> Self {
        Self {
            format,
            allow_create: true,
        }
    }

    /// Serializes as a `samlp:NameIDPolicy` element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            "<samlp:NameIDPolicy Format=\"{}\" AllowCreate=\"{}\"/>",
            self.format.uri(),
            self.allow_create
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_format_resolves_uri() {
        let id = NameId::new("a@b.com").with_format(NameIdFormat::Email);
        assert_eq!(id.known_format(), Some(NameIdFormat::Email));

        let mut odd = NameId::new("x");
        odd.format = Some("urn:example:custom".to_string());
        assert_eq!(odd.known_format(), None);
    }

    #[test]
    fn name_id_xml_escapes_value() {
        let mut id = NameId::new("a&b").with_format(NameIdFormat::Persistent);
        id.sp_name_qualifier = Some("https://sp.example.com".to_string());
        assert_eq!(
            id.to_xml(),
            "<saml:NameID Format=\"urn:oasis:names:tc:SAML:2.0:nameid-format:persistent\" \
             SPNameQualifier=\"https://sp.example.com\">a&amp;b</saml:NameID>"
        );
    }

    #[test]
    fn policy_xml() {
        let policy = NameIdPolicy::allow_create(NameIdFormat::Transient);
        assert_eq!(
            policy.to_xml(),
            "<samlp:NameIDPolicy Format=\"urn:oasis:names:tc:SAML:2.0:nameid-format:transient\" AllowCreate=\"true\"/>"
        );
    }
}
