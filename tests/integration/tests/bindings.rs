//! Outbound encodings and metadata as an IdP receives them.

use sp_protocol_saml::bindings::{decode_post, decode_redirect, encode_post, encode_redirect, HttpRedirectBinding};
use sp_protocol_saml::types::{SamlBinding, SAMLP_NS};
use sp_protocol_saml::{xml, AuthnRequestBuilder, SignatureVerifier, SpMetadata, TrustAnchor};
use url::Url;

use crate::common::{fixture, settings};

fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Codec round trips on awkward text.
#[test]
fn test_codecs_round_trip() -> anyhow::Result<()> {
    let long = "x".repeat(10_000);
    for text in ["", "plain", "<a b=\"&amp;\">ünïcödé + / = ?</a>", long.as_str()] {
        assert_eq!(decode_redirect(&encode_redirect(text)?)?, text);
        assert_eq!(decode_post(&encode_post(text))?, text);
    }
    Ok(())
}

/// The login URL starts with the IdP SSO URL and carries the request.
#[test]
fn test_redirect_url_shape() -> anyhow::Result<()> {
    let s = settings();
    let builder = AuthnRequestBuilder::new(&s)?;
    let request = builder.build(false, true, false);
    let url = builder.to_redirect_url(&request, Some("/after"))?;

    assert!(url.starts_with("https://idp.example.com/sso?"));
    assert!(url.contains("SAMLRequest="));
    assert_eq!(query_param(&url, "RelayState").as_deref(), Some("/after"));

    let xml_text = decode_redirect(&query_param(&url, "SAMLRequest").unwrap_or_default())?;
    let doc = xml::parse(&xml_text)?;
    let root = doc.root_element();
    assert!(xml::is_element(root, SAMLP_NS, "AuthnRequest"));
    assert_eq!(root.attribute("IsPassive"), Some("true"));
    assert_eq!(root.attribute("ProtocolBinding"), Some(SamlBinding::HttpPost.uri()));
    Ok(())
}

/// A signed login URL verifies with the SP certificate the IdP holds.
#[test]
fn test_signed_redirect_verifies() -> anyhow::Result<()> {
    let mut s = settings();
    s.security.sign_requests = true;
    let builder = AuthnRequestBuilder::new(&s)?;
    let url = builder.to_redirect_url(&builder.build(false, false, false), Some("/x"))?;

    let idp_side = SignatureVerifier::new(vec![TrustAnchor::certificate_pem(&fixture("sp.crt"))?]);
    assert!(HttpRedirectBinding::verify_signature(&url, &idp_side).is_ok());

    let tampered = url.replace("RelayState=%2Fx", "RelayState=%2Fy");
    assert!(HttpRedirectBinding::verify_signature(&tampered, &idp_side).is_err());
    Ok(())
}

/// Metadata advertises the SP certificate and endpoints.
#[test]
fn test_metadata_document() -> anyhow::Result<()> {
    let s = settings();
    let metadata = SpMetadata::generate(&s)?;
    let doc = xml::parse(&metadata)?;
    assert_eq!(doc.root_element().attribute("entityID"), Some("https://sp.example.com"));
    assert!(metadata.contains("AssertionConsumerService"));
    assert!(metadata.contains("SingleLogoutService"));
    assert!(metadata.contains("X509Certificate"));
    Ok(())
}
