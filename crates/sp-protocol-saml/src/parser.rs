//! Decoding and structural parsing of inbound `samlp:Response` messages.
//!
//! The parser never fails: every problem is recorded on the returned
//! [`ParsedResponse`] as a structural [`ValidationError`].

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

use crate::bindings::decode_post;
use crate::error::ValidationError;
use crate::types::{
    parse_instant, Assertion, NameId, ParsedResponse, Status, BEARER_CONFIRMATION, SAMLP_NS,
    SAML_NS,
};
use crate::xml;

/// Parser for POST-binding `SAMLResponse` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Parses the raw `SAMLResponse` form field.
    ///
    /// An absent or empty field yields a response whose only error is
    /// [`ValidationError::ResponseNotFound`].
    #[must_use]
    pub fn parse(saml_response: Option<&str>) -> ParsedResponse {
        let Some(encoded) = saml_response.filter(|v| !v.trim().is_empty()) else {
            tracing::debug!("no SAMLResponse field in request");
            return ParsedResponse::failed(ValidationError::ResponseNotFound);
        };
        match decode_post(encoded) {
            Ok(xml_text) => Self::parse_xml(xml_text),
            Err(e) => {
                tracing::debug!("SAMLResponse does not decode: {e}");
                ParsedResponse::failed(ValidationError::Malformed(format!(
                    "cannot decode SAMLResponse: {e}"
                )))
            }
        }
    }

    /// Parses an already decoded response document.
    #[must_use]
    pub fn parse_xml(xml_text: String) -> ParsedResponse {
        let mut response = ParsedResponse::from_raw(xml_text.clone());
        let outcome = xml::parse(&xml_text)
            .map_err(|e| format!("invalid XML: {e}"))
            .and_then(|doc| fill_response(&doc, &mut response));

        match outcome {
            Ok(()) => tracing::debug!(
                id = response.id.as_deref().unwrap_or("-"),
                issuer = response.issuer.as_deref().unwrap_or("-"),
                has_assertion = response.assertion.is_some(),
                "parsed SAML response"
            ),
            Err(reason) => {
                tracing::debug!("SAML response is malformed: {reason}");
                response.push_error(ValidationError::Malformed(reason));
            }
        }
        response
    }
}

fn fill_response(doc: &Document<'_>, response: &mut ParsedResponse) -> Result<(), String> {
    let root = doc.root_element();
    if !xml::is_element(root, SAMLP_NS, "Response") {
        return Err(format!(
            "root element is {{{}}}{}, expected samlp:Response",
            root.tag_name().namespace().unwrap_or_default(),
            root.tag_name().name()
        ));
    }

    response.id = root.attribute("ID").map(str::to_string);
    response.in_response_to = root.attribute("InResponseTo").map(str::to_string);
    response.destination = root.attribute("Destination").map(str::to_string);
    response.issue_instant = instant_attr(root, "IssueInstant")?;
    response.issuer = xml::child_text(root, SAML_NS, "Issuer");
    response.status = Some(parse_status(root)?);

    let assertions: Vec<_> = xml::children(root, SAML_NS, "Assertion").collect();
    response.assertion = match assertions.as_slice() {
        [] if xml::child(root, SAML_NS, "EncryptedAssertion").is_some() => {
            return Err("encrypted assertions are not supported".to_string());
        }
        [] => None,
        [assertion] => Some(parse_assertion(*assertion)?),
        _ => return Err(format!("{} assertions in one response", assertions.len())),
    };
    Ok(())
}

fn parse_status(root: Node<'_, '_>) -> Result<Status, String> {
    let status = xml::child(root, SAMLP_NS, "Status").ok_or("missing Status")?;
    let code = xml::child(status, SAMLP_NS, "StatusCode").ok_or("missing StatusCode")?;
    let value = code.attribute("Value").ok_or("StatusCode without Value")?;

    let mut parsed = Status::new(value);
    parsed.sub_code = xml::child(code, SAMLP_NS, "StatusCode")
        .and_then(|sub| sub.attribute("Value"))
        .map(str::to_string);
    parsed.message = xml::child_text(status, SAMLP_NS, "StatusMessage");
    Ok(parsed)
}

fn parse_assertion(node: Node<'_, '_>) -> Result<Assertion, String> {
    let mut assertion = Assertion {
        id: node.attribute("ID").map(str::to_string),
        issuer: xml::child_text(node, SAML_NS, "Issuer"),
        ..Assertion::default()
    };

    let mut confirmation_not_on_or_after = None;
    if let Some(subject) = xml::child(node, SAML_NS, "Subject") {
        assertion.name_id = xml::child(subject, SAML_NS, "NameID").map(|n| NameId {
            value: xml::text_content(n),
            format: n.attribute("Format").map(str::to_string),
            name_qualifier: n.attribute("NameQualifier").map(str::to_string),
            sp_name_qualifier: n.attribute("SPNameQualifier").map(str::to_string),
        });

        let confirmations: Vec<_> = xml::children(subject, SAML_NS, "SubjectConfirmation").collect();
        let confirmation = confirmations
            .iter()
            .find(|c| c.attribute("Method") == Some(BEARER_CONFIRMATION))
            .or_else(|| confirmations.first());
        if let Some(data) = confirmation.and_then(|c| xml::child(*c, SAML_NS, "SubjectConfirmationData")) {
            confirmation_not_on_or_after = instant_attr(data, "NotOnOrAfter")?;
        }
    }

    if let Some(conditions) = xml::child(node, SAML_NS, "Conditions") {
        assertion.not_before = instant_attr(conditions, "NotBefore")?;
        assertion.not_on_or_after = instant_attr(conditions, "NotOnOrAfter")?;
        assertion.audiences = xml::children(conditions, SAML_NS, "AudienceRestriction")
            .flat_map(|r| xml::children(r, SAML_NS, "Audience"))
            .map(xml::text_content)
            .filter(|a| !a.is_empty())
            .collect();
    }
    if assertion.not_on_or_after.is_none() {
        assertion.not_on_or_after = confirmation_not_on_or_after;
    }

    assertion.session_index = xml::child(node, SAML_NS, "AuthnStatement")
        .and_then(|s| s.attribute("SessionIndex"))
        .map(str::to_string);

    for statement in xml::children(node, SAML_NS, "AttributeStatement") {
        for attribute in xml::children(statement, SAML_NS, "Attribute") {
            let Some(name) = attribute.attribute("Name") else {
                continue;
            };
            assertion
                .attributes
                .entry(name.to_string())
                .or_default()
                .extend(xml::children(attribute, SAML_NS, "AttributeValue").map(xml::text_content));
        }
    }

    Ok(assertion)
}

fn instant_attr(node: Node<'_, '_>, name: &str) -> Result<Option<DateTime<Utc>>, String> {
    node.attribute(name)
        .map(|value| parse_instant(value).ok_or_else(|| format!("invalid {name} '{value}'")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::encode_post;
    use crate::error::ErrorKind;
    use crate::types::{status_codes, NameIdFormat};

    const SIGNED_ASSERTION: &str = include_str!("../testdata/response-signed-assertion.xml");

    fn response(body: &str) -> String {
        format!(
            concat!(
                r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" "#,
                r#"xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_r" InResponseTo="_q" "#,
                r#"IssueInstant="2024-01-01T00:00:00Z">"#,
                "<saml:Issuer>https://idp.example.com</saml:Issuer>{}</samlp:Response>"
            ),
            body
        )
    }

    const SUCCESS: &str = r#"<samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>"#;

    #[test]
    fn parses_fixture() {
        let parsed = ResponseParser::parse(Some(&encode_post(SIGNED_ASSERTION)));
        assert!(parsed.errors().is_empty());
        assert_eq!(parsed.id.as_deref(), Some("_resp1"));
        assert_eq!(parsed.in_response_to.as_deref(), Some("_req1"));
        assert_eq!(parsed.issuer.as_deref(), Some("https://idp.example.com"));
        assert_eq!(parsed.destination.as_deref(), Some("https://sp.example.com/acs"));
        assert!(parsed.is_success());
        assert_eq!(parsed.raw_xml(), Some(SIGNED_ASSERTION));

        let assertion = parsed.assertion.unwrap();
        assert_eq!(assertion.id.as_deref(), Some("_assert1"));
        assert_eq!(assertion.issuer.as_deref(), Some("https://idp.example.com"));
        let name_id = assertion.name_id.unwrap();
        assert_eq!(name_id.value, "a@b.com");
        assert_eq!(name_id.known_format(), Some(NameIdFormat::Email));
        assert_eq!(assertion.audiences, vec!["https://sp.example.com"]);
        assert_eq!(assertion.not_before, parse_instant("2000-01-01T00:00:00Z"));
        assert_eq!(assertion.not_on_or_after, parse_instant("2999-01-01T00:00:00Z"));
        assert_eq!(assertion.attributes["email"], vec!["a@b.com"]);
        assert_eq!(assertion.attributes["groups"], vec!["admins", "staff & friends"]);
    }

    #[test]
    fn absent_field_is_single_error() {
        for field in [None, Some(""), Some("  ")] {
            let parsed = ResponseParser::parse(field);
            assert_eq!(parsed.errors(), &[ValidationError::ResponseNotFound]);
            assert!(parsed.assertion.is_none());
        }
    }

    #[test]
    fn bad_base64_is_structural() {
        let parsed = ResponseParser::parse(Some("@@not-base64@@"));
        assert_eq!(parsed.errors().len(), 1);
        assert_eq!(parsed.errors()[0].kind(), ErrorKind::Structural);
    }

    #[test]
    fn bad_xml_is_structural() {
        let parsed = ResponseParser::parse(Some(&encode_post("<samlp:Response")));
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(_)]));
    }

    #[test]
    fn doctype_is_rejected() {
        let xml_text = format!("<!DOCTYPE r [<!ENTITY x \"y\">]>{}", response(SUCCESS));
        let parsed = ResponseParser::parse_xml(xml_text);
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(_)]));
    }

    #[test]
    fn wrong_root_is_structural() {
        let parsed = ResponseParser::parse_xml(
            r#"<Response xmlns="urn:example:decoy" ID="_r"/>"#.to_string(),
        );
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(m)] if m.contains("expected samlp:Response")));
    }

    #[test]
    fn missing_status_is_structural() {
        let parsed = ResponseParser::parse_xml(response(""));
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(m)] if m == "missing Status"));
    }

    #[test]
    fn status_with_sub_code_and_message() {
        let status = r#"<samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Responder"><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:AuthnFailed"/></samlp:StatusCode><samlp:StatusMessage>bad password</samlp:StatusMessage></samlp:Status>"#;
        let parsed = ResponseParser::parse_xml(response(status));
        let status = parsed.status.unwrap();
        assert_eq!(status.code, status_codes::RESPONDER);
        assert_eq!(status.sub_code.as_deref(), Some(status_codes::AUTHN_FAILED));
        assert_eq!(status.message.as_deref(), Some("bad password"));
        assert!(parsed.assertion.is_none());
    }

    #[test]
    fn decoy_issuer_in_foreign_namespace_is_ignored() {
        let xml_text = response(SUCCESS).replacen(
            "<saml:Issuer>",
            r#"<x:Issuer xmlns:x="urn:example:decoy">https://evil.example.com</x:Issuer><saml:Issuer>"#,
            1,
        );
        let parsed = ResponseParser::parse_xml(xml_text);
        assert_eq!(parsed.issuer.as_deref(), Some("https://idp.example.com"));
    }

    #[test]
    fn multiple_assertions_are_structural() {
        let body = format!(r#"{SUCCESS}<saml:Assertion ID="_a"/><saml:Assertion ID="_b"/>"#);
        let parsed = ResponseParser::parse_xml(response(&body));
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(_)]));
    }

    #[test]
    fn encrypted_assertion_is_structural() {
        let body = format!(r#"{SUCCESS}<saml:EncryptedAssertion/>"#);
        let parsed = ResponseParser::parse_xml(response(&body));
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(m)] if m.contains("encrypted")));
    }

    #[test]
    fn subject_confirmation_supplies_not_on_or_after() {
        let body = format!(
            concat!(
                "{}<saml:Assertion ID=\"_a\"><saml:Issuer>https://idp.example.com</saml:Issuer>",
                "<saml:Subject><saml:NameID>user</saml:NameID>",
                "<saml:SubjectConfirmation Method=\"urn:oasis:names:tc:SAML:2.0:cm:bearer\">",
                "<saml:SubjectConfirmationData NotOnOrAfter=\"2030-01-01T00:05:00Z\" Recipient=\"https://sp.example.com/acs\"/>",
                "</saml:SubjectConfirmation></saml:Subject>",
                "<saml:AuthnStatement AuthnInstant=\"2030-01-01T00:00:00Z\" SessionIndex=\"_s1\"/>",
                "</saml:Assertion>"
            ),
            SUCCESS
        );
        let parsed = ResponseParser::parse_xml(response(&body));
        let assertion = parsed.assertion.unwrap();
        assert_eq!(assertion.not_before, None);
        assert_eq!(assertion.not_on_or_after, parse_instant("2030-01-01T00:05:00Z"));
        assert_eq!(assertion.session_index.as_deref(), Some("_s1"));
        assert_eq!(assertion.name_id.unwrap().format, None);
    }

    #[test]
    fn repeated_attribute_names_append_in_order() {
        let body = format!(
            concat!(
                "{}<saml:Assertion ID=\"_a\"><saml:AttributeStatement>",
                "<saml:Attribute Name=\"role\"><saml:AttributeValue>b</saml:AttributeValue></saml:Attribute>",
                "<saml:Attribute Name=\"role\"><saml:AttributeValue>a</saml:AttributeValue>",
                "<saml:AttributeValue/></saml:Attribute>",
                "</saml:AttributeStatement></saml:Assertion>"
            ),
            SUCCESS
        );
        let parsed = ResponseParser::parse_xml(response(&body));
        assert_eq!(parsed.assertion.unwrap().attributes["role"], vec!["b", "a", ""]);
    }

    #[test]
    fn invalid_timestamp_is_structural() {
        let body = format!(
            "{SUCCESS}<saml:Assertion ID=\"_a\"><saml:Conditions NotBefore=\"yesterday\"/></saml:Assertion>"
        );
        let parsed = ResponseParser::parse_xml(response(&body));
        assert!(matches!(parsed.errors(), [ValidationError::Malformed(m)] if m.contains("NotBefore")));
    }
}
