//! SAML Assertion data as extracted from an inbound response.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NameId;

/// Attribute name -> values, in document order.
///
/// An attribute name that appears more than once has all its values appended
/// to a single list.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// The subset of a SAML assertion the SP acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion `ID`.
    pub id: Option<String>,

    /// Assertion issuer.
    pub issuer: Option<String>,

    /// Subject name identifier.
    pub name_id: Option<NameId>,

    /// `SessionIndex` from the first `AuthnStatement`.
    pub session_index: Option<String>,

    /// Start of validity. Taken from `Conditions`.
    pub not_before: Option<DateTime<Utc>>,

    /// End of validity, exclusive. Taken from `Conditions`, falling back to the
    /// bearer `SubjectConfirmationData`.
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Audiences from every `AudienceRestriction`.
    pub audiences: Vec<String>,

    /// Attributes from every `AttributeStatement`.
    pub attributes: Attributes,
}

impl Assertion {
    /// Returns the values of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Returns the first value of an attribute.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup() {
        let mut assertion = Assertion::default();
        assertion.attributes.insert(
            "groups".to_string(),
            vec!["admins".to_string(), "staff".to_string()],
        );

        assert_eq!(assertion.attribute("groups").unwrap().len(), 2);
        assert_eq!(assertion.first_value("groups"), Some("admins"));
        assert!(assertion.attribute("email").is_none());
    }
}
