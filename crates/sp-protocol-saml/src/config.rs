//! Typed service-provider settings.
//!
//! All settings deserialize with `serde`; enums accept either their URI or a
//! short alias (`"redirect"`, `"email"`, `"rsa-sha256"`, `"sha256"`).

use std::fmt;

use serde::{Deserialize, Serialize};
use sp_crypto::HashAlgorithm;
use url::Url;

use crate::error::{SamlError, SamlResult};
use crate::signature::{DigestAlgorithm, SignatureAlgorithm};
use crate::types::{NameIdFormat, SamlBinding};

/// A protocol endpoint: location plus binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint location.
    pub url: Url,
    /// Binding used at this location.
    #[serde(default)]
    pub binding: SamlBinding,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub const fn new(url: Url, binding: SamlBinding) -> Self {
        Self { url, binding }
    }
}

/// Service provider (this side) settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpConfig {
    /// SP entity ID.
    pub entity_id: String,
    /// Where the IdP posts responses.
    pub assertion_consumer_service: Endpoint,
    /// Where the IdP sends logout messages.
    #[serde(default)]
    pub single_logout_service: Option<Endpoint>,
    /// Requested NameID format.
    #[serde(default)]
    pub name_id_format: NameIdFormat,
    /// SP certificate (PEM).
    #[serde(default)]
    pub certificate: Option<String>,
    /// SP private key (PEM, PKCS#8 or PKCS#1).
    #[serde(default)]
    pub private_key: Option<String>,
}

impl fmt::Debug for SpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpConfig")
            .field("entity_id", &self.entity_id)
            .field("assertion_consumer_service", &self.assertion_consumer_service)
            .field("single_logout_service", &self.single_logout_service)
            .field("name_id_format", &self.name_id_format)
            .field("certificate", &self.certificate.as_ref().map(|_| "<pem>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    /// IdP entity ID; responses and assertions must carry it as issuer.
    pub entity_id: String,
    /// Single sign-on endpoint.
    pub single_sign_on_service: Endpoint,
    /// Single logout endpoint.
    #[serde(default)]
    pub single_logout_service: Option<Endpoint>,
    /// Trusted signing certificate (PEM).
    #[serde(default)]
    pub certificate: Option<String>,
    /// Trusted certificate fingerprint, hex with or without colons.
    #[serde(default)]
    pub certificate_fingerprint: Option<String>,
    /// Hash used for `certificate_fingerprint`.
    #[serde(default)]
    pub fingerprint_algorithm: HashAlgorithm,
}

impl IdpConfig {
    /// Whether a certificate or fingerprint is configured.
    #[must_use]
    pub fn has_trust_anchor(&self) -> bool {
        self.certificate.as_deref().is_some_and(|c| !c.trim().is_empty())
            || self
                .certificate_fingerprint
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty())
    }
}

/// Signing and verification requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// Sign outbound `AuthnRequest`s.
    pub sign_requests: bool,
    /// Sign outbound `LogoutRequest`s.
    pub sign_logout_requests: bool,
    /// Require a signed (and present) assertion.
    pub want_assertions_signed: bool,
    /// Require a signature on the response envelope.
    pub want_response_signed: bool,
    /// Algorithm for outbound signatures.
    pub signature_algorithm: SignatureAlgorithm,
    /// Digest for outbound signatures.
    pub digest_algorithm: DigestAlgorithm,
    /// Refuse SHA-1 in both directions.
    pub reject_deprecated_algorithms: bool,
    /// Tolerance applied to `NotBefore` and `NotOnOrAfter`.
    pub clock_skew_seconds: u64,
    /// Minimum time a consumed message ID is remembered.
    pub replay_ttl_seconds: u64,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            sign_requests: false,
            sign_logout_requests: false,
            want_assertions_signed: true,
            want_response_signed: false,
            signature_algorithm: SignatureAlgorithm::RsaSha256,
            digest_algorithm: DigestAlgorithm::Sha256,
            reject_deprecated_algorithms: true,
            clock_skew_seconds: 0,
            replay_ttl_seconds: 3600,
        }
    }
}

impl SecurityPolicy {
    /// Whether any inbound signature is required.
    #[must_use]
    pub const fn requires_signature(&self) -> bool {
        self.want_assertions_signed || self.want_response_signed
    }
}

/// Complete engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamlSettings {
    /// This service provider.
    pub sp: SpConfig,
    /// The trusted identity provider.
    pub idp: IdpConfig,
    /// Signing and verification requirements.
    #[serde(default)]
    pub security: SecurityPolicy,
}

impl SamlSettings {
    /// Creates settings with the default security policy.
    #[must_use]
    pub fn new(sp: SpConfig, idp: IdpConfig) -> Self {
        Self {
            sp,
            idp,
            security: SecurityPolicy::default(),
        }
    }

    /// Replaces the security policy.
    #[must_use]
    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.security = security;
        self
    }

    /// Checks the settings for deployment defects.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] describing the first defect found.
    pub fn validate(&self) -> SamlResult<()> {
        if self.sp.entity_id.trim().is_empty() {
            return Err(SamlError::Configuration("SP entity ID is empty".to_string()));
        }
        if self.idp.entity_id.trim().is_empty() {
            return Err(SamlError::Configuration("IdP entity ID is empty".to_string()));
        }
        if self.security.requires_signature() && !self.idp.has_trust_anchor() {
            return Err(SamlError::Configuration(
                "signatures are required but no IdP certificate or fingerprint is configured"
                    .to_string(),
            ));
        }
        let has_key = self
            .sp
            .private_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if self.security.sign_requests && !has_key {
            return Err(SamlError::Configuration(
                "request signing is enabled but no SP private key is configured".to_string(),
            ));
        }
        if self.security.sign_logout_requests && !has_key {
            return Err(SamlError::Configuration(
                "logout request signing is enabled but no SP private key is configured"
                    .to_string(),
            ));
        }
        if self.security.reject_deprecated_algorithms {
            if self.security.signature_algorithm.is_deprecated() {
                return Err(SamlError::Configuration(format!(
                    "deprecated signature algorithm {}",
                    self.security.signature_algorithm.uri()
                )));
            }
            if self.security.digest_algorithm.is_deprecated() {
                return Err(SamlError::Configuration(format!(
                    "deprecated digest algorithm {}",
                    self.security.digest_algorithm.uri()
                )));
            }
        }
        Ok(())
    }
}
