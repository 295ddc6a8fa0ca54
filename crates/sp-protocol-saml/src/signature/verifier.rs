//! XML Signature validation.
//!
//! Verifies enveloped signatures on SAML responses and assertions against a
//! configured trust anchor.

use std::collections::HashSet;

use base64::Engine;
use roxmltree::{Document, Node};
use sp_crypto::{CryptoError, HashAlgorithm, PublicKey};
use tracing::debug;

use crate::certificate::{embedded_certificate, fingerprint_der, normalize_fingerprint, pem_to_der};
use crate::config::{IdpConfig, SecurityPolicy};
use crate::error::SamlResult;
use crate::types::{transforms, XMLDSIG_NS};
use crate::xml;

use super::{
    inclusive_prefixes, locate_signature, CanonicalizationAlgorithm, DigestAlgorithm,
    LocatedSignature, SignatureAlgorithm, SignatureError, SignatureScope,
};

/// What the verifier trusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    /// A certificate (DER) whose key verifies signatures directly.
    Certificate(Vec<u8>),
    /// A certificate fingerprint; the embedded certificate must match it.
    Fingerprint {
        /// Hex digits, uppercase, no separators.
        value: String,
        /// Hash the fingerprint was computed with.
        algorithm: HashAlgorithm,
    },
}

impl TrustAnchor {
    /// Trusts a PEM certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM does not decode.
    pub fn certificate_pem(pem: &str) -> SamlResult<Self> {
        Ok(Self::Certificate(pem_to_der(pem)?))
    }

    /// Trusts certificates with the given fingerprint.
    #[must_use]
    pub fn fingerprint(value: &str, algorithm: HashAlgorithm) -> Self {
        Self::Fingerprint {
            value: normalize_fingerprint(value),
            algorithm,
        }
    }

    fn public_key(&self, signature: Node<'_, '_>) -> Result<PublicKey, SignatureError> {
        match self {
            Self::Certificate(der) => PublicKey::from_certificate_der(der)
                .map_err(|e| SignatureError::InvalidCertificate(e.to_string())),
            Self::Fingerprint { value, algorithm } => {
                let embedded = embedded_certificate(signature).ok_or(SignatureError::MissingCertificate)?;
                let der = base64::engine::general_purpose::STANDARD
                    .decode(embedded)
                    .map_err(|e| SignatureError::InvalidCertificate(e.to_string()))?;
                if normalize_fingerprint(&fingerprint_der(&der, *algorithm)) != *value {
                    return Err(SignatureError::UntrustedCertificate);
                }
                PublicKey::from_certificate_der(&der)
                    .map_err(|e| SignatureError::InvalidCertificate(e.to_string()))
            }
        }
    }
}

/// A signature that verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// ID of the signed element.
    pub signed_id: String,
    /// Signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// Digest algorithm used by the reference.
    pub digest: DigestAlgorithm,
}

/// XML signature verifier.
///
/// Holds the trust anchors for one identity provider. Failures are returned
/// as [`SignatureError`] values; nothing panics on hostile input.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    anchors: Vec<TrustAnchor>,
    reject_deprecated: bool,
}

impl SignatureVerifier {
    /// Creates a verifier that refuses deprecated algorithms.
    #[must_use]
    pub fn new(anchors: Vec<TrustAnchor>) -> Self {
        Self {
            anchors,
            reject_deprecated: true,
        }
    }

    /// Sets whether SHA-1 signatures and digests are refused.
    #[must_use]
    pub const fn reject_deprecated(mut self, reject: bool) -> Self {
        self.reject_deprecated = reject;
        self
    }

    /// Builds the verifier for an identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured certificate does not decode.
    pub fn for_idp(idp: &IdpConfig, policy: &SecurityPolicy) -> SamlResult<Self> {
        let mut anchors = Vec::new();
        if let Some(pem) = idp.certificate.as_deref().filter(|c| !c.trim().is_empty()) {
            anchors.push(TrustAnchor::certificate_pem(pem)?);
        }
        if let Some(fp) = idp
            .certificate_fingerprint
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            anchors.push(TrustAnchor::fingerprint(fp, idp.fingerprint_algorithm));
        }
        Ok(Self::new(anchors).reject_deprecated(policy.reject_deprecated_algorithms))
    }

    /// Whether any trust anchor is configured.
    #[must_use]
    pub fn has_trust_anchor(&self) -> bool {
        !self.anchors.is_empty()
    }

    /// Verifies the signature covering `scope` in `xml_text`.
    ///
    /// # Errors
    ///
    /// Returns the reason the signature is not accepted.
    pub fn verify(&self, xml_text: &str, scope: SignatureScope) -> Result<VerifiedSignature, SignatureError> {
        let doc = xml::parse(xml_text).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        self.verify_document(&doc, scope)
    }

    /// Like [`verify`](Self::verify) but only reports success.
    #[must_use]
    pub fn is_valid(&self, xml_text: &str, scope: SignatureScope) -> bool {
        self.verify(xml_text, scope).is_ok()
    }

    /// Verifies the signature covering `scope` in a parsed document.
    ///
    /// # Errors
    ///
    /// Returns the reason the signature is not accepted.
    pub fn verify_document(
        &self,
        doc: &Document<'_>,
        scope: SignatureScope,
    ) -> Result<VerifiedSignature, SignatureError> {
        if self.anchors.is_empty() {
            return Err(SignatureError::NoTrustAnchor);
        }
        ensure_unique_ids(doc)?;
        let located = locate_signature(doc, scope).ok_or(SignatureError::NotFound(scope))?;
        self.verify_located(located)
    }

    /// Verifies a detached signature, as carried by the redirect binding.
    ///
    /// Only certificate anchors apply; there is no embedded certificate to
    /// compare with a fingerprint.
    ///
    /// # Errors
    ///
    /// Returns the reason the signature is not accepted.
    pub fn verify_detached(
        &self,
        data: &[u8],
        sig_alg: &str,
        signature_b64: &str,
    ) -> Result<SignatureAlgorithm, SignatureError> {
        if self.anchors.is_empty() {
            return Err(SignatureError::NoTrustAnchor);
        }
        let algorithm = self.signature_algorithm(sig_alg)?;
        let signature = decode_b64(signature_b64, "Signature")?;

        let mut last = SignatureError::MissingCertificate;
        for anchor in &self.anchors {
            let TrustAnchor::Certificate(der) = anchor else {
                continue;
            };
            let result = PublicKey::from_certificate_der(der)
                .map_err(|e| SignatureError::InvalidCertificate(e.to_string()))
                .and_then(|key| check(&key, algorithm, data, &signature));
            match result {
                Ok(()) => return Ok(algorithm),
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    fn signature_algorithm(&self, uri: &str) -> Result<SignatureAlgorithm, SignatureError> {
        let algorithm = SignatureAlgorithm::from_uri(uri)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(uri.to_string()))?;
        if self.reject_deprecated && algorithm.is_deprecated() {
            return Err(SignatureError::DeprecatedAlgorithm(uri.to_string()));
        }
        Ok(algorithm)
    }

    fn verify_located(&self, located: LocatedSignature<'_, '_>) -> Result<VerifiedSignature, SignatureError> {
        let signature = located.signature;
        let mut signed_infos = xml::children(signature, XMLDSIG_NS, "SignedInfo");
        let signed_info = signed_infos
            .next()
            .ok_or_else(|| malformed("missing SignedInfo"))?;
        if signed_infos.next().is_some() {
            return Err(malformed("more than one SignedInfo"));
        }

        let c14n_method = xml::child(signed_info, XMLDSIG_NS, "CanonicalizationMethod")
            .ok_or_else(|| malformed("missing CanonicalizationMethod"))?;
        let c14n_uri = algorithm_attr(c14n_method)?;
        let signed_info_c14n = CanonicalizationAlgorithm::from_uri(c14n_uri)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(c14n_uri.to_string()))?;
        let signed_info_prefixes = inclusive_prefixes(c14n_method);

        let method = xml::child(signed_info, XMLDSIG_NS, "SignatureMethod")
            .ok_or_else(|| malformed("missing SignatureMethod"))?;
        let algorithm = self.signature_algorithm(algorithm_attr(method)?)?;

        let references: Vec<_> = xml::children(signed_info, XMLDSIG_NS, "Reference").collect();
        let [reference] = references.as_slice() else {
            return Err(malformed("expected exactly one Reference"));
        };

        let signed_id = xml::id_attribute(located.signed)
            .ok_or_else(|| malformed("signed element has no ID"))?;
        let expected = format!("#{signed_id}");
        let reference_uri = reference.attribute("URI").unwrap_or_default();
        if reference_uri != expected {
            return Err(SignatureError::ReferenceMismatch {
                reference: reference_uri.to_string(),
                expected,
            });
        }

        let mut enveloped = false;
        let mut reference_c14n = CanonicalizationAlgorithm::C14N;
        let mut reference_prefixes = Vec::new();
        if let Some(list) = xml::child(*reference, XMLDSIG_NS, "Transforms") {
            for transform in xml::children(list, XMLDSIG_NS, "Transform") {
                let uri = algorithm_attr(transform)?;
                if uri == transforms::ENVELOPED_SIGNATURE {
                    enveloped = true;
                } else if let Some(c14n) = CanonicalizationAlgorithm::from_uri(uri) {
                    reference_c14n = c14n;
                    reference_prefixes = inclusive_prefixes(transform);
                } else {
                    return Err(SignatureError::UnsupportedAlgorithm(uri.to_string()));
                }
            }
        }
        if !enveloped {
            return Err(malformed("enveloped-signature transform missing"));
        }

        let digest_method = xml::child(*reference, XMLDSIG_NS, "DigestMethod")
            .ok_or_else(|| malformed("missing DigestMethod"))?;
        let digest_uri = algorithm_attr(digest_method)?;
        let digest = DigestAlgorithm::from_uri(digest_uri)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(digest_uri.to_string()))?;
        if self.reject_deprecated && digest.is_deprecated() {
            return Err(SignatureError::DeprecatedAlgorithm(digest_uri.to_string()));
        }

        let declared = xml::child(*reference, XMLDSIG_NS, "DigestValue")
            .map(xml::text_content)
            .ok_or_else(|| malformed("missing DigestValue"))?;
        let declared = decode_b64(&declared, "DigestValue")?;

        let canonical = xml::canonicalize(
            located.signed,
            &reference_c14n.options(&reference_prefixes, Some(signature.id())),
        );
        let computed = sp_crypto::hash(digest.hash_algorithm(), canonical.as_bytes());
        if !sp_crypto::digests_equal(&computed, &declared) {
            debug!(signed_id, "reference digest mismatch");
            return Err(SignatureError::DigestMismatch);
        }

        let value = xml::child(signature, XMLDSIG_NS, "SignatureValue")
            .map(xml::text_content)
            .ok_or_else(|| malformed("missing SignatureValue"))?;
        let value = decode_b64(&value, "SignatureValue")?;
        let signed_info_canonical =
            xml::canonicalize(signed_info, &signed_info_c14n.options(&signed_info_prefixes, None));

        let mut last = SignatureError::InvalidSignature;
        for anchor in &self.anchors {
            let result = anchor
                .public_key(signature)
                .and_then(|key| check(&key, algorithm, signed_info_canonical.as_bytes(), &value));
            match result {
                Ok(()) => {
                    debug!(signed_id, algorithm = algorithm.uri(), "signature verified");
                    return Ok(VerifiedSignature {
                        signed_id: signed_id.to_string(),
                        algorithm,
                        digest,
                    });
                }
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

fn check(key: &PublicKey, algorithm: SignatureAlgorithm, data: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    key.verify(algorithm.to_crypto(), data, signature)
        .map_err(|e| match e {
            CryptoError::UnsupportedAlgorithm(msg) => SignatureError::UnsupportedAlgorithm(msg),
            _ => SignatureError::InvalidSignature,
        })
}

fn malformed(reason: &str) -> SignatureError {
    SignatureError::Malformed(reason.to_string())
}

fn algorithm_attr<'a>(node: Node<'a, '_>) -> Result<&'a str, SignatureError> {
    node.attribute("Algorithm")
        .ok_or_else(|| malformed("Algorithm attribute missing"))
}

fn decode_b64(value: &str, what: &str) -> Result<Vec<u8>, SignatureError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| SignatureError::Malformed(format!("{what} is not base64: {e}")))
}

fn ensure_unique_ids(doc: &Document<'_>) -> Result<(), SignatureError> {
    let mut seen = HashSet::new();
    for node in doc.descendants().filter(Node::is_element) {
        if let Some(id) = xml::id_attribute(node) {
            if !seen.insert(id) {
                return Err(SignatureError::DuplicateId(id.to_string()));
            }
        }
    }
    Ok(())
}
