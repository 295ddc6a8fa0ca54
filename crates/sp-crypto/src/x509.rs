//! Public keys and metadata recovered from X.509 certificates.

use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use chrono::{DateTime, Utc};
use x509_parser::oid_registry::{OID_KEY_TYPE_EC_PUBLIC_KEY, OID_PKCS1_RSAENCRYPTION};
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::algorithm::{EllipticCurve, SignatureAlgorithm};
use crate::error::{CryptoError, CryptoResult};

/// A verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// RSA key as a DER `RSAPublicKey`.
    Rsa(Vec<u8>),

    /// EC key as an uncompressed SEC1 point.
    Ec {
        /// Curve inferred from the point size.
        curve: EllipticCurve,
        /// Uncompressed point bytes.
        point: Vec<u8>,
    },
}

impl PublicKey {
    /// Extracts the subject public key from a DER certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate does not parse or carries a key type
    /// other than RSA or NIST-curve EC.
    pub fn from_certificate_der(der: &[u8]) -> CryptoResult<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let spki = cert.public_key();
        let bits: &[u8] = &spki.subject_public_key.data;

        if spki.algorithm.algorithm == OID_PKCS1_RSAENCRYPTION {
            Ok(Self::Rsa(bits.to_vec()))
        } else if spki.algorithm.algorithm == OID_KEY_TYPE_EC_PUBLIC_KEY {
            let curve = EllipticCurve::from_point_len(bits.len()).ok_or_else(|| {
                CryptoError::InvalidCertificate(format!(
                    "unsupported EC point length {}",
                    bits.len()
                ))
            })?;
            Ok(Self::Ec {
                curve,
                point: bits.to_vec(),
            })
        } else {
            Err(CryptoError::InvalidCertificate(format!(
                "unsupported key algorithm {}",
                spki.algorithm.algorithm
            )))
        }
    }

    /// Returns a short description such as `RSA` or `EC P-256`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Rsa(_) => "RSA".to_string(),
            Self::Ec { curve, .. } => format!("EC {}", curve.name()),
        }
    }

    /// Verifies `sig` over `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] when the algorithm does
    /// not match the key type and [`CryptoError::Verification`] otherwise.
    pub fn verify(&self, algorithm: SignatureAlgorithm, data: &[u8], sig: &[u8]) -> CryptoResult<()> {
        let (verification_alg, key): (&'static dyn VerificationAlgorithm, &[u8]) = match self {
            Self::Rsa(key) => {
                let alg: &'static dyn VerificationAlgorithm = match algorithm {
                    SignatureAlgorithm::RsaSha1 => {
                        &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY
                    }
                    SignatureAlgorithm::RsaSha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
                    SignatureAlgorithm::RsaSha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
                    SignatureAlgorithm::RsaSha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
                    other => return Err(mismatch(other, self)),
                };
                (alg, key.as_slice())
            }
            Self::Ec { curve, point } => {
                let alg: &'static dyn VerificationAlgorithm = match (algorithm, curve) {
                    (SignatureAlgorithm::EcdsaSha256, EllipticCurve::P256) => {
                        &signature::ECDSA_P256_SHA256_FIXED
                    }
                    (SignatureAlgorithm::EcdsaSha384, EllipticCurve::P384) => {
                        &signature::ECDSA_P384_SHA384_FIXED
                    }
                    (SignatureAlgorithm::EcdsaSha512, EllipticCurve::P521) => {
                        &signature::ECDSA_P521_SHA512_FIXED
                    }
                    (other, _) => return Err(mismatch(other, self)),
                };
                (alg, point.as_slice())
            }
        };

        UnparsedPublicKey::new(verification_alg, key)
            .verify(data, sig)
            .map_err(|_| CryptoError::Verification)
    }
}

fn mismatch(algorithm: SignatureAlgorithm, key: &PublicKey) -> CryptoError {
    CryptoError::UnsupportedAlgorithm(format!("{algorithm:?} with {} key", key.describe()))
}

/// Human-oriented facts about a certificate.
#[derive(Debug, Clone)]
pub struct CertificateSummary {
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub not_after: DateTime<Utc>,
    /// Key type description.
    pub key_type: String,
}

impl CertificateSummary {
    /// Summarizes a DER certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate does not parse.
    pub fn from_der(der: &[u8]) -> CryptoResult<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let validity = cert.validity();

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial_as_string(),
            not_before: timestamp(validity.not_before.timestamp())?,
            not_after: timestamp(validity.not_after.timestamp())?,
            key_type: PublicKey::from_certificate_der(der)
                .map(|key| key.describe())
                .unwrap_or_else(|_| "unknown".to_string()),
        })
    }
}

fn timestamp(secs: i64) -> CryptoResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CryptoError::InvalidCertificate(format!("validity out of range: {secs}")))
}
