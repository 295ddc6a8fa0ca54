//! XML Signature creation.
//!
//! Signs outbound SAML messages with an enveloped signature placed right
//! after the message `Issuer`.

use base64::Engine;
use sp_crypto::SigningKey;
use tracing::debug;

use crate::certificate::pem_to_der;
use crate::config::{SecurityPolicy, SpConfig};
use crate::error::{SamlError, SamlResult};
use crate::types::{transforms, SAML_NS, XMLDSIG_NS};
use crate::xml::{self, C14nOptions};

use super::{CanonicalizationAlgorithm, DigestAlgorithm, SignatureAlgorithm};

/// XML document signer.
///
/// Signs SAML documents using the configured private key.
pub struct XmlSigner {
    key: SigningKey,
    certificate_der: Option<Vec<u8>>,
    algorithm: SignatureAlgorithm,
    digest: DigestAlgorithm,
}

impl std::fmt::Debug for XmlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlSigner")
            .field("algorithm", &self.algorithm)
            .field("digest", &self.digest)
            .field("has_certificate", &self.certificate_der.is_some())
            .finish_non_exhaustive()
    }
}

impl XmlSigner {
    /// Creates a signer from a DER private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not parse or does not fit `algorithm`.
    pub fn new(
        private_key_der: &[u8],
        certificate_der: Option<Vec<u8>>,
        algorithm: SignatureAlgorithm,
        digest: DigestAlgorithm,
    ) -> SamlResult<Self> {
        let key = SigningKey::from_der(private_key_der, algorithm.to_crypto())?;
        Ok(Self {
            key,
            certificate_der,
            algorithm,
            digest,
        })
    }

    /// Creates a signer from PEM-encoded key and certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if either PEM does not decode or the key is unusable.
    pub fn from_pem(
        private_key_pem: &str,
        certificate_pem: Option<&str>,
        algorithm: SignatureAlgorithm,
        digest: DigestAlgorithm,
    ) -> SamlResult<Self> {
        let key_der = sp_crypto::decode_pem(private_key_pem)?;
        let certificate_der = certificate_pem.map(pem_to_der).transpose()?;
        Self::new(&key_der, certificate_der, algorithm, digest)
    }

    /// Creates the signer for this service provider.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] when no private key is configured.
    pub fn for_sp(sp: &SpConfig, policy: &SecurityPolicy) -> SamlResult<Self> {
        let key = sp
            .private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SamlError::Configuration("no SP private key configured".to_string()))?;
        Self::from_pem(
            key,
            sp.certificate.as_deref(),
            policy.signature_algorithm,
            policy.digest_algorithm,
        )
    }

    /// The signature algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Signs raw bytes, as the redirect binding does for its query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing operation fails.
    pub fn sign_data(&self, data: &[u8]) -> SamlResult<Vec<u8>> {
        self.key
            .sign(data)
            .map_err(|e| SamlError::SignatureCreation(e.to_string()))
    }

    /// Signs the root element of `xml_text` with an enveloped signature.
    ///
    /// The root must carry an `ID` and a `saml:Issuer` child; the signature
    /// is inserted immediately after the issuer.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse, lacks an ID or
    /// issuer, or signing fails.
    pub fn sign(&self, xml_text: &str) -> SamlResult<String> {
        let doc = xml::parse(xml_text)?;
        let root = doc.root_element();
        let id = xml::id_attribute(root)
            .ok_or_else(|| SamlError::MissingElement("ID attribute on root element".to_string()))?;
        let issuer = xml::child(root, SAML_NS, "Issuer")
            .ok_or_else(|| SamlError::MissingElement("Issuer".to_string()))?;
        let insert_at = issuer.range().end;

        let c14n = CanonicalizationAlgorithm::ExclusiveC14N;
        let canonical = xml::canonicalize(root, &c14n.options(&[], None));
        let digest = sp_crypto::hash(self.digest.hash_algorithm(), canonical.as_bytes());
        let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

        let signed_info = format!(
            concat!(
                "<ds:SignedInfo>",
                "<ds:CanonicalizationMethod Algorithm=\"{c14n}\"/>",
                "<ds:SignatureMethod Algorithm=\"{sig}\"/>",
                "<ds:Reference URI=\"#{id}\">",
                "<ds:Transforms>",
                "<ds:Transform Algorithm=\"{enveloped}\"/>",
                "<ds:Transform Algorithm=\"{c14n}\"/>",
                "</ds:Transforms>",
                "<ds:DigestMethod Algorithm=\"{digest}\"/>",
                "<ds:DigestValue>{digest_value}</ds:DigestValue>",
                "</ds:Reference>",
                "</ds:SignedInfo>"
            ),
            c14n = c14n.uri(),
            sig = self.algorithm.uri(),
            id = xml::escape_attr(id),
            enveloped = transforms::ENVELOPED_SIGNATURE,
            digest = self.digest.uri(),
            digest_value = digest_b64,
        );

        let canonical_signed_info = canonical_signed_info(&signed_info, &c14n)?;
        let signature_value = self.sign_data(canonical_signed_info.as_bytes())?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature_value);

        let key_info = self
            .certificate_der
            .as_ref()
            .map(|der| {
                format!(
                    "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>",
                    base64::engine::general_purpose::STANDARD.encode(der)
                )
            })
            .unwrap_or_default();

        let signature = format!(
            "<ds:Signature xmlns:ds=\"{XMLDSIG_NS}\">{signed_info}<ds:SignatureValue>{signature_b64}</ds:SignatureValue>{key_info}</ds:Signature>"
        );

        debug!(id, algorithm = self.algorithm.uri(), "signed XML message");
        let mut signed = String::with_capacity(xml_text.len() + signature.len());
        signed.push_str(&xml_text[..insert_at]);
        signed.push_str(&signature);
        signed.push_str(&xml_text[insert_at..]);
        Ok(signed)
    }
}

/// Canonical form of `SignedInfo` as it will appear inside `ds:Signature`.
fn canonical_signed_info(signed_info: &str, c14n: &CanonicalizationAlgorithm) -> SamlResult<String> {
    let wrapper = format!("<ds:Signature xmlns:ds=\"{XMLDSIG_NS}\">{signed_info}</ds:Signature>");
    let doc = xml::parse(&wrapper)?;
    let node = xml::child(doc.root_element(), XMLDSIG_NS, "SignedInfo")
        .ok_or_else(|| SamlError::SignatureCreation("SignedInfo not produced".to_string()))?;
    let options: C14nOptions<'_> = c14n.options(&[], None);
    Ok(xml::canonicalize(node, &options))
}
