//! XML Signature support for SAML.
//!
//! Verification of enveloped signatures on inbound responses and assertions,
//! and creation of enveloped signatures on outbound requests.
//!
//! # Signing Algorithms
//!
//! - RSA-SHA256 (default), RSA-SHA384, RSA-SHA512
//! - ECDSA-SHA256, ECDSA-SHA384, ECDSA-SHA512
//! - RSA-SHA1, verification only and refused unless the policy allows
//!   deprecated algorithms

mod signer;
mod verifier;

pub use signer::*;
pub use verifier::*;

use std::fmt;

use roxmltree::{Document, Node, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorKind, SamlError};
use crate::types::{
    canonicalization_algorithms, digest_algorithms, signature_algorithms, EXC_C14N_NS, SAMLP_NS,
    SAML_NS, XMLDSIG_NS,
};
use crate::xml::{self, C14nOptions};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
    /// Legacy RSA with SHA-1 (not recommended).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::EcdsaSha256 => signature_algorithms::ECDSA_SHA256,
            Self::EcdsaSha384 => signature_algorithms::ECDSA_SHA384,
            Self::EcdsaSha512 => signature_algorithms::ECDSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            signature_algorithms::ECDSA_SHA384 => Some(Self::EcdsaSha384),
            signature_algorithms::ECDSA_SHA512 => Some(Self::EcdsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Parses a URI or a short alias such as `rsa-sha256`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_uri(name).or_else(|| match name.to_ascii_lowercase().as_str() {
            "rsa-sha256" => Some(Self::RsaSha256),
            "rsa-sha384" => Some(Self::RsaSha384),
            "rsa-sha512" => Some(Self::RsaSha512),
            "ecdsa-sha256" => Some(Self::EcdsaSha256),
            "ecdsa-sha384" => Some(Self::EcdsaSha384),
            "ecdsa-sha512" => Some(Self::EcdsaSha512),
            "rsa-sha1" => Some(Self::RsaSha1),
            _ => None,
        })
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }

    /// The equivalent primitive in `sp-crypto`.
    #[must_use]
    pub const fn to_crypto(self) -> sp_crypto::SignatureAlgorithm {
        match self {
            Self::RsaSha256 => sp_crypto::SignatureAlgorithm::RsaSha256,
            Self::RsaSha384 => sp_crypto::SignatureAlgorithm::RsaSha384,
            Self::RsaSha512 => sp_crypto::SignatureAlgorithm::RsaSha512,
            Self::EcdsaSha256 => sp_crypto::SignatureAlgorithm::EcdsaSha256,
            Self::EcdsaSha384 => sp_crypto::SignatureAlgorithm::EcdsaSha384,
            Self::EcdsaSha512 => sp_crypto::SignatureAlgorithm::EcdsaSha512,
            Self::RsaSha1 => sp_crypto::SignatureAlgorithm::RsaSha1,
        }
    }
}

impl TryFrom<String> for SignatureAlgorithm {
    type Error = SamlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value).ok_or(SamlError::UnsupportedUri {
            kind: "signature algorithm",
            value,
        })
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(value: SignatureAlgorithm) -> Self {
        value.uri().to_string()
    }
}

/// Digest algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DigestAlgorithm {
    /// SHA-256 (recommended).
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// Legacy SHA-1.
    Sha1,
}

impl DigestAlgorithm {
    /// Returns the URI for this digest algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Sha256 => digest_algorithms::SHA256,
            Self::Sha384 => digest_algorithms::SHA384,
            Self::Sha512 => digest_algorithms::SHA512,
            Self::Sha1 => digest_algorithms::SHA1,
        }
    }

    /// Parses a digest algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            digest_algorithms::SHA256 => Some(Self::Sha256),
            digest_algorithms::SHA384 => Some(Self::Sha384),
            digest_algorithms::SHA512 => Some(Self::Sha512),
            digest_algorithms::SHA1 => Some(Self::Sha1),
            _ => None,
        }
    }

    /// Parses a URI or a short alias such as `sha256`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_uri(name).or_else(|| {
            sp_crypto::HashAlgorithm::from_name(name)
                .ok()
                .map(Self::from_hash)
        })
    }

    /// Returns true for SHA-1.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::Sha1)
    }

    /// The hash primitive in `sp-crypto`.
    #[must_use]
    pub const fn hash_algorithm(self) -> sp_crypto::HashAlgorithm {
        match self {
            Self::Sha256 => sp_crypto::HashAlgorithm::Sha256,
            Self::Sha384 => sp_crypto::HashAlgorithm::Sha384,
            Self::Sha512 => sp_crypto::HashAlgorithm::Sha512,
            Self::Sha1 => sp_crypto::HashAlgorithm::Sha1,
        }
    }

    const fn from_hash(hash: sp_crypto::HashAlgorithm) -> Self {
        match hash {
            sp_crypto::HashAlgorithm::Sha1 => Self::Sha1,
            sp_crypto::HashAlgorithm::Sha256 => Self::Sha256,
            sp_crypto::HashAlgorithm::Sha384 => Self::Sha384,
            sp_crypto::HashAlgorithm::Sha512 => Self::Sha512,
        }
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = SamlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value).ok_or(SamlError::UnsupportedUri {
            kind: "digest algorithm",
            value,
        })
    }
}

impl From<DigestAlgorithm> for String {
    fn from(value: DigestAlgorithm) -> Self {
        value.uri().to_string()
    }
}

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments (recommended).
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
    /// C14N without comments.
    C14N,
    /// C14N with comments.
    C14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
            Self::C14N => canonicalization_algorithms::C14N,
            Self::C14NWithComments => canonicalization_algorithms::C14N_WITH_COMMENTS,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            canonicalization_algorithms::C14N => Some(Self::C14N),
            canonicalization_algorithms::C14N_WITH_COMMENTS => Some(Self::C14NWithComments),
            _ => None,
        }
    }

    /// Canonicalizer options for this algorithm.
    #[must_use]
    pub fn options<'a>(&self, inclusive_prefixes: &'a [String], exclude: Option<NodeId>) -> C14nOptions<'a> {
        C14nOptions {
            exclusive: matches!(self, Self::ExclusiveC14N | Self::ExclusiveC14NWithComments),
            with_comments: matches!(self, Self::ExclusiveC14NWithComments | Self::C14NWithComments),
            inclusive_prefixes,
            exclude,
        }
    }
}

/// Which element a signature must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScope {
    /// The root `samlp:Response`.
    Response,
    /// The top-level `saml:Assertion`.
    Assertion,
    /// First signature found on the root, then the top-level assertion, then a
    /// top-level response.
    Document,
}

impl fmt::Display for SignatureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Response => "response",
            Self::Assertion => "assertion",
            Self::Document => "document",
        })
    }
}

/// Reasons a signature is not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature on the element under validation.
    #[error("no signature found on {0}")]
    NotFound(SignatureScope),

    /// Neither a certificate nor a fingerprint is configured.
    #[error("no trusted IdP certificate or fingerprint configured")]
    NoTrustAnchor,

    /// Signature structure is incomplete or not decodable.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// Algorithm not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Algorithm refused by policy.
    #[error("deprecated algorithm refused: {0}")]
    DeprecatedAlgorithm(String),

    /// Reference does not point at the element that carries the signature.
    #[error("signature reference {reference} does not cover element {expected}")]
    ReferenceMismatch {
        /// Reference URI in `SignedInfo`.
        reference: String,
        /// `#ID` of the enclosing element.
        expected: String,
    },

    /// The same ID appears on more than one element.
    #[error("duplicate ID {0} in document")]
    DuplicateId(String),

    /// Recomputed digest differs from `DigestValue`.
    #[error("reference digest mismatch")]
    DigestMismatch,

    /// Fingerprint trust requires an embedded certificate.
    #[error("no embedded certificate to check against the trusted fingerprint")]
    MissingCertificate,

    /// Embedded certificate does not match the trusted fingerprint.
    #[error("embedded certificate does not match the trusted fingerprint")]
    UntrustedCertificate,

    /// Trusted or embedded certificate cannot be used.
    #[error("unusable certificate: {0}")]
    InvalidCertificate(String),

    /// Cryptographic check of `SignatureValue` failed.
    #[error("signature value does not verify")]
    InvalidSignature,
}

impl SignatureError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoTrustAnchor => ErrorKind::Configuration,
            _ => ErrorKind::Trust,
        }
    }
}

/// A `ds:Signature` and the element it is enveloped in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocatedSignature<'a, 'input> {
    pub signed: Node<'a, 'input>,
    pub signature: Node<'a, 'input>,
}

/// The top-level assertion: a direct child of a response root, or the root itself.
pub(crate) fn top_level_assertion<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let root = doc.root_element();
    if xml::is_element(root, SAML_NS, "Assertion") {
        Some(root)
    } else {
        xml::child(root, SAML_NS, "Assertion")
    }
}

pub(crate) fn locate_signature<'a, 'input>(
    doc: &'a Document<'input>,
    scope: SignatureScope,
) -> Option<LocatedSignature<'a, 'input>> {
    let root = doc.root_element();
    let enveloped = |signed: Node<'a, 'input>| {
        xml::child(signed, XMLDSIG_NS, "Signature").map(|signature| LocatedSignature { signed, signature })
    };

    match scope {
        SignatureScope::Response => {
            if xml::is_element(root, SAMLP_NS, "Response") {
                enveloped(root)
            } else {
                None
            }
        }
        SignatureScope::Assertion => top_level_assertion(doc).and_then(enveloped),
        SignatureScope::Document => enveloped(root)
            .or_else(|| xml::child(root, SAML_NS, "Assertion").and_then(enveloped))
            .or_else(|| xml::child(root, SAMLP_NS, "Response").and_then(enveloped)),
    }
}

/// `PrefixList` of an `ec:InclusiveNamespaces` child, if any.
pub(crate) fn inclusive_prefixes(method: Node<'_, '_>) -> Vec<String> {
    xml::child(method, EXC_C14N_NS, "InclusiveNamespaces")
        .and_then(|n| n.attribute("PrefixList"))
        .map(|list| list.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
