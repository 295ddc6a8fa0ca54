//! Common test utilities and fixtures.

use std::path::PathBuf;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use sp_protocol_saml::bindings::encode_post;
use sp_protocol_saml::session::SAML_RESPONSE_PARAM;
use sp_protocol_saml::signature::{DigestAlgorithm, SignatureAlgorithm, XmlSigner};
use sp_protocol_saml::types::{format_instant, status_codes, NameIdFormat, SamlBinding, SAMLP_NS, SAML_NS};
use sp_protocol_saml::xml::{escape_attr, escape_text};
use sp_protocol_saml::{AuthSession, Endpoint, IdpConfig, RequestContext, SamlSettings, SpConfig};
use url::Url;

/// IdP entity ID used throughout.
pub const IDP_ENTITY_ID: &str = "https://idp.example.com";
/// SP entity ID used throughout.
pub const SP_ENTITY_ID: &str = "https://sp.example.com";
/// SP assertion consumer service.
pub const ACS_URL: &str = "https://sp.example.com/acs";

/// Installs a test subscriber once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sp_protocol_saml=debug")
        .with_test_writer()
        .try_init();
}

/// Reads a file from the engine's fixture directory.
pub fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "..", "..", "crates", "sp-protocol-saml", "testdata", name]
        .iter()
        .collect();
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()))
}

/// Settings trusting the RSA IdP certificate, with SP key material loaded.
pub fn settings() -> SamlSettings {
    init_tracing();
    let sp = SpConfig {
        entity_id: SP_ENTITY_ID.to_string(),
        assertion_consumer_service: Endpoint::new(Url::parse(ACS_URL).unwrap(), SamlBinding::HttpPost),
        single_logout_service: Some(Endpoint::new(
            Url::parse("https://sp.example.com/slo").unwrap(),
            SamlBinding::HttpRedirect,
        )),
        name_id_format: NameIdFormat::Email,
        certificate: Some(fixture("sp.crt")),
        private_key: Some(fixture("sp.key")),
    };
    let idp = IdpConfig {
        entity_id: IDP_ENTITY_ID.to_string(),
        single_sign_on_service: Endpoint::new(
            Url::parse("https://idp.example.com/sso").unwrap(),
            SamlBinding::HttpRedirect,
        ),
        single_logout_service: Some(Endpoint::new(
            Url::parse("https://idp.example.com/slo").unwrap(),
            SamlBinding::HttpRedirect,
        )),
        certificate: Some(fixture("idp.crt")),
        certificate_fingerprint: None,
        fingerprint_algorithm: sp_crypto::HashAlgorithm::Sha256,
    };
    SamlSettings::new(sp, idp)
}

/// A session as the ACS sees it: the posted response plus the stored request ID.
pub fn acs_session(response_xml: &str, request_id: Option<&str>) -> AuthSession {
    let context = RequestContext::new("https", "sp.example.com", "/acs")
        .with_post(SAML_RESPONSE_PARAM, encode_post(response_xml));
    let mut session = AuthSession::new(context);
    if let Some(id) = request_id {
        session.set_last_request_id(id);
    }
    session
}

/// What the simulated IdP puts in a response.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    /// Issuer of the response and assertion.
    pub issuer: String,
    /// Top-level status code.
    pub status: String,
    /// `InResponseTo`.
    pub in_response_to: Option<String>,
    /// `NotBefore`.
    pub not_before: DateTime<Utc>,
    /// `NotOnOrAfter`.
    pub not_on_or_after: DateTime<Utc>,
    /// Audience restriction.
    pub audience: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, Vec<String>)>,
    /// Sign the assertion.
    pub sign_assertion: bool,
    /// Sign the response envelope.
    pub sign_response: bool,
}

impl ResponseSpec {
    /// A successful response valid for five minutes either side of now.
    pub fn success(in_response_to: Option<&str>) -> Self {
        let now = Utc::now().trunc_subsecs(0);
        Self {
            issuer: IDP_ENTITY_ID.to_string(),
            status: status_codes::SUCCESS.to_string(),
            in_response_to: in_response_to.map(str::to_string),
            not_before: now - Duration::minutes(5),
            not_on_or_after: now + Duration::minutes(5),
            audience: SP_ENTITY_ID.to_string(),
            attributes: vec![("email".to_string(), vec!["a@b.com".to_string()])],
            sign_assertion: true,
            sign_response: false,
        }
    }
}

/// Signs responses with the fixture IdP key.
pub struct IdpSimulator {
    signer: XmlSigner,
}

impl IdpSimulator {
    /// RSA-SHA256 signer with the IdP fixture key.
    pub fn new() -> Self {
        Self::with_key(&fixture("idp.key"), &fixture("idp.crt"))
    }

    /// A signer for arbitrary key material.
    pub fn with_key(key_pem: &str, cert_pem: &str) -> Self {
        let signer = XmlSigner::from_pem(
            key_pem,
            Some(cert_pem),
            SignatureAlgorithm::RsaSha256,
            DigestAlgorithm::Sha256,
        )
        .expect("fixture key");
        Self { signer }
    }

    /// Builds a response document.
    pub fn response(&self, spec: &ResponseSpec) -> anyhow::Result<String> {
        let now = format_instant(&Utc::now());
        let assertion_id = sp_crypto::generate_message_id();
        let response_id = sp_crypto::generate_message_id();
        let in_response_to = spec
            .in_response_to
            .as_deref()
            .map(|id| format!(" InResponseTo=\"{}\"", escape_attr(id)))
            .unwrap_or_default();

        let attributes: String = spec
            .attributes
            .iter()
            .map(|(name, values)| {
                let values: String = values
                    .iter()
                    .map(|v| format!("<saml:AttributeValue>{}</saml:AttributeValue>", escape_text(v)))
                    .collect();
                format!("<saml:Attribute Name=\"{}\">{values}</saml:Attribute>", escape_attr(name))
            })
            .collect();

        let assertion = format!(
            concat!(
                "<saml:Assertion xmlns:saml=\"{saml}\" ID=\"{aid}\" Version=\"2.0\" IssueInstant=\"{now}\">",
                "<saml:Issuer>{issuer}</saml:Issuer>",
                "<saml:Subject>",
                "<saml:NameID Format=\"{format}\">a@b.com</saml:NameID>",
                "<saml:SubjectConfirmation Method=\"urn:oasis:names:tc:SAML:2.0:cm:bearer\">",
                "<saml:SubjectConfirmationData NotOnOrAfter=\"{noa}\" Recipient=\"{acs}\"{irt}/>",
                "</saml:SubjectConfirmation>",
                "</saml:Subject>",
                "<saml:Conditions NotBefore=\"{nb}\" NotOnOrAfter=\"{noa}\">",
                "<saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>",
                "</saml:Conditions>",
                "<saml:AuthnStatement AuthnInstant=\"{now}\" SessionIndex=\"_session-{aid}\">",
                "<saml:AuthnContext><saml:AuthnContextClassRef>",
                "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport",
                "</saml:AuthnContextClassRef></saml:AuthnContext>",
                "</saml:AuthnStatement>",
                "<saml:AttributeStatement>{attributes}</saml:AttributeStatement>",
                "</saml:Assertion>"
            ),
            saml = SAML_NS,
            aid = assertion_id,
            now = now,
            issuer = escape_text(&spec.issuer),
            format = NameIdFormat::Email.uri(),
            noa = format_instant(&spec.not_on_or_after),
            nb = format_instant(&spec.not_before),
            acs = ACS_URL,
            irt = in_response_to,
            audience = escape_text(&spec.audience),
            attributes = attributes,
        );
        let assertion = if spec.sign_assertion {
            self.signer.sign(&assertion)?
        } else {
            assertion
        };

        let response = format!(
            concat!(
                "<samlp:Response xmlns:samlp=\"{samlp}\" xmlns:saml=\"{saml}\" ID=\"{rid}\" Version=\"2.0\" ",
                "IssueInstant=\"{now}\" Destination=\"{acs}\"{irt}>",
                "<saml:Issuer>{issuer}</saml:Issuer>",
                "<samlp:Status><samlp:StatusCode Value=\"{status}\"/></samlp:Status>",
                "{assertion}",
                "</samlp:Response>"
            ),
            samlp = SAMLP_NS,
            saml = SAML_NS,
            rid = response_id,
            now = now,
            acs = ACS_URL,
            irt = in_response_to,
            issuer = escape_text(&spec.issuer),
            status = escape_attr(&spec.status),
            assertion = assertion,
        );

        Ok(if spec.sign_response {
            self.signer.sign(&response)?
        } else {
            response
        })
    }
}
