//! Private signing keys.
//!
//! ## Supported Algorithms
//!
//! ### RSA (PKCS#1 v1.5)
//! - RSA-SHA256, RSA-SHA384, RSA-SHA512
//!
//! ### ECDSA (fixed-width `r || s` output)
//! - P-256/SHA-256, P-384/SHA-384, P-521/SHA-512
//!
//! RSA-SHA1 is accepted for verification only and is refused here.

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, EcdsaKeyPair, KeyPair, RsaKeyPair},
};

use crate::algorithm::{EllipticCurve, SignatureAlgorithm};
use crate::error::{CryptoError, CryptoResult};
use crate::x509::PublicKey;

enum KeyMaterial {
    Rsa(RsaKeyPair),
    Ecdsa(EcdsaKeyPair),
}

/// A private key bound to the algorithm it signs with.
pub struct SigningKey {
    material: KeyMaterial,
    algorithm: SignatureAlgorithm,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Creates a signing key from DER-encoded private key material.
    ///
    /// PKCS#8 is tried first. RSA keys additionally accept the traditional
    /// `RSAPrivateKey` encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not parse or does not fit `algorithm`.
    pub fn from_der(der: &[u8], algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        let material = if algorithm.is_rsa() {
            if algorithm == SignatureAlgorithm::RsaSha1 {
                return Err(CryptoError::UnsupportedAlgorithm(
                    "RSA-SHA1 signing is not supported".to_string(),
                ));
            }
            let key_pair = RsaKeyPair::from_pkcs8(der)
                .or_else(|_| RsaKeyPair::from_der(der))
                .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA key: {e}")))?;
            KeyMaterial::Rsa(key_pair)
        } else {
            let signing_alg = match algorithm.curve() {
                Some(EllipticCurve::P256) => &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
                Some(EllipticCurve::P384) => &signature::ECDSA_P384_SHA384_FIXED_SIGNING,
                Some(EllipticCurve::P521) => &signature::ECDSA_P521_SHA512_FIXED_SIGNING,
                None => {
                    return Err(CryptoError::UnsupportedAlgorithm(format!("{algorithm:?}")));
                }
            };
            let key_pair = EcdsaKeyPair::from_pkcs8(signing_alg, der)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid EC PKCS#8 key: {e}")))?;
            KeyMaterial::Ecdsa(key_pair)
        };

        Ok(Self {
            material,
            algorithm,
        })
    }

    /// Returns the signature algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Returns the public half of the key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match &self.material {
            KeyMaterial::Rsa(key_pair) => PublicKey::Rsa(key_pair.public_key().as_ref().to_vec()),
            KeyMaterial::Ecdsa(key_pair) => {
                let point = key_pair.public_key().as_ref().to_vec();
                let curve = self.algorithm.curve().unwrap_or(EllipticCurve::P256);
                PublicKey::Ec { curve, point }
            }
        }
    }

    /// Signs the given data.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let rng = SystemRandom::new();

        match &self.material {
            KeyMaterial::Rsa(key_pair) => {
                let padding = match self.algorithm {
                    SignatureAlgorithm::RsaSha256 => &signature::RSA_PKCS1_SHA256,
                    SignatureAlgorithm::RsaSha384 => &signature::RSA_PKCS1_SHA384,
                    SignatureAlgorithm::RsaSha512 => &signature::RSA_PKCS1_SHA512,
                    other => {
                        return Err(CryptoError::UnsupportedAlgorithm(format!(
                            "{other:?} not supported for RSA signing"
                        )));
                    }
                };
                let mut signature = vec![0u8; key_pair.public_modulus_len()];
                key_pair
                    .sign(padding, &rng, data, &mut signature)
                    .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;
                Ok(signature)
            }
            KeyMaterial::Ecdsa(key_pair) => key_pair
                .sign(&rng, data)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|e| CryptoError::Signing(format!("ECDSA signing failed: {e}"))),
        }
    }
}
