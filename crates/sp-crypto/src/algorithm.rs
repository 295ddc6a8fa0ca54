//! Cryptographic algorithm definitions.
//!
//! SHA-1 and RSA-SHA1 are kept for interoperability with older identity
//! providers. They are flagged as deprecated so that policy code can refuse them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for algorithm operations.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Unknown algorithm.
    #[error("unknown algorithm: {0}")]
    Unknown(String),

    /// Known algorithm, but not usable for the requested operation.
    #[error("algorithm '{0}' is not supported here")]
    Unsupported(String),
}

/// Digest algorithms used for fingerprints and XML-DSig references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-1 (legacy).
    #[serde(rename = "sha1", alias = "SHA1", alias = "SHA-1")]
    Sha1,

    /// SHA-256.
    #[default]
    #[serde(rename = "sha256", alias = "SHA256", alias = "SHA-256")]
    Sha256,

    /// SHA-384.
    #[serde(rename = "sha384", alias = "SHA384", alias = "SHA-384")]
    Sha384,

    /// SHA-512.
    #[serde(rename = "sha512", alias = "SHA512", alias = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns the algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Returns whether the algorithm is considered cryptographically broken.
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::Sha1)
    }

    /// Parses an algorithm name such as `sha256` or `SHA-256`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the name is not recognised.
    pub fn from_name(name: &str) -> Result<Self, AlgorithmError> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(AlgorithmError::Unknown(name.to_string())),
        }
    }
}

/// Signature schemes supported for signing and verification.
///
/// ECDSA signatures use the fixed-width `r || s` encoding that XML-DSig and
/// the redirect binding require, not ASN.1 DER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-1 (legacy, verification only).
    #[serde(rename = "RS1")]
    RsaSha1,

    /// RSA PKCS#1 v1.5 with SHA-256.
    #[serde(rename = "RS256")]
    RsaSha256,

    /// RSA PKCS#1 v1.5 with SHA-384.
    #[serde(rename = "RS384")]
    RsaSha384,

    /// RSA PKCS#1 v1.5 with SHA-512.
    #[serde(rename = "RS512")]
    RsaSha512,

    /// ECDSA using P-256 and SHA-256.
    #[serde(rename = "ES256")]
    EcdsaSha256,

    /// ECDSA using P-384 and SHA-384.
    #[serde(rename = "ES384")]
    EcdsaSha384,

    /// ECDSA using P-521 and SHA-512.
    #[serde(rename = "ES512")]
    EcdsaSha512,
}

impl SignatureAlgorithm {
    /// Returns the hash algorithm used by this signature algorithm.
    #[must_use]
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha1 => HashAlgorithm::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 => HashAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => HashAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 => HashAlgorithm::Sha512,
        }
    }

    /// Returns whether this is an ECDSA algorithm.
    #[must_use]
    pub const fn is_ecdsa(self) -> bool {
        matches!(
            self,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512
        )
    }

    /// Returns whether this is an RSA algorithm.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        !self.is_ecdsa()
    }

    /// Returns the curve an ECDSA algorithm is bound to.
    #[must_use]
    pub const fn curve(self) -> Option<EllipticCurve> {
        match self {
            Self::EcdsaSha256 => Some(EllipticCurve::P256),
            Self::EcdsaSha384 => Some(EllipticCurve::P384),
            Self::EcdsaSha512 => Some(EllipticCurve::P521),
            _ => None,
        }
    }

    /// Returns whether the algorithm relies on a deprecated digest.
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        self.hash_algorithm().is_deprecated()
    }
}

/// Elliptic curves accepted in certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EllipticCurve {
    /// NIST P-256.
    #[serde(rename = "P-256")]
    P256,

    /// NIST P-384.
    #[serde(rename = "P-384")]
    P384,

    /// NIST P-521.
    #[serde(rename = "P-521")]
    P521,
}

impl EllipticCurve {
    /// Returns the curve name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Infers the curve from the length of an uncompressed SEC1 point.
    #[must_use]
    pub const fn from_point_len(len: usize) -> Option<Self> {
        match len {
            65 => Some(Self::P256),
            97 => Some(Self::P384),
            133 => Some(Self::P521),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_names_parse_loosely() {
        assert_eq!(HashAlgorithm::from_name("SHA-256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::from_name("sha1").unwrap(), HashAlgorithm::Sha1);
        assert!(matches!(
            HashAlgorithm::from_name("md5"),
            Err(AlgorithmError::Unknown(_))
        ));
    }

    #[test]
    fn sha1_is_deprecated() {
        assert!(HashAlgorithm::Sha1.is_deprecated());
        assert!(SignatureAlgorithm::RsaSha1.is_deprecated());
        assert!(!SignatureAlgorithm::EcdsaSha256.is_deprecated());
    }

    #[test]
    fn ecdsa_algorithms_know_their_curve() {
        assert_eq!(SignatureAlgorithm::EcdsaSha384.curve(), Some(EllipticCurve::P384));
        assert_eq!(SignatureAlgorithm::RsaSha256.curve(), None);
        assert!(SignatureAlgorithm::RsaSha512.is_rsa());
    }

    #[test]
    fn curve_from_point_length() {
        assert_eq!(EllipticCurve::from_point_len(65), Some(EllipticCurve::P256));
        assert_eq!(EllipticCurve::from_point_len(133), Some(EllipticCurve::P521));
        assert_eq!(EllipticCurve::from_point_len(64), None);
    }

    #[test]
    fn hash_algorithm_deserializes_from_aliases() {
        let alg: HashAlgorithm = serde_json::from_str("\"SHA-384\"").unwrap();
        assert_eq!(alg, HashAlgorithm::Sha384);
    }
}
