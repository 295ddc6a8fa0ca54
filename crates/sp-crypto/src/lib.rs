//! # sp-crypto
//!
//! Cryptographic primitives for the SAML service provider, backed by aws-lc-rs.
//!
//! Everything here is in-process and synchronous. Nothing shells out, touches the
//! filesystem, or keeps global state beyond the system random source.
//!
//! ## Modules
//!
//! - [`hash`] - SHA-1/SHA-2 digests and constant-time comparison
//! - [`keys`] - private signing keys (RSA PKCS#1 v1.5, ECDSA fixed-width)
//! - [`pem`] - PEM armor decoding
//! - [`x509`] - public keys and summaries recovered from X.509 certificates
//! - [`random`] - unguessable protocol message identifiers
//!
//! ## Legacy algorithms
//!
//! SHA-1 is available for digests and RSA verification because deployed identity
//! providers still emit it. Callers decide whether to accept it; see
//! [`HashAlgorithm::is_deprecated`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod error;
pub mod hash;
pub mod keys;
pub mod pem;
pub mod random;
pub mod x509;

pub use algorithm::{AlgorithmError, EllipticCurve, HashAlgorithm, SignatureAlgorithm};
pub use error::{CryptoError, CryptoResult};
pub use hash::{digests_equal, hash, sha1, sha256, sha384, sha512};
pub use keys::SigningKey;
pub use pem::decode_pem;
pub use random::{generate_message_id, random_bytes};
pub use x509::{CertificateSummary, PublicKey};
