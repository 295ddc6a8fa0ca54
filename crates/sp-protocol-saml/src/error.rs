//! SAML error types.
//!
//! [`SamlError`] is returned by API calls that cannot complete (bad encoding,
//! missing configuration, signing failure). Per-response rejections are not API
//! failures; they are accumulated as [`ValidationError`] values on the parsed
//! response and rendered to text only at the session boundary.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::signature::SignatureError;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML operation errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid message format or content.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// XML signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// Certificate could not be read.
    #[error("invalid certificate: {0}")]
    Certificate(String),

    /// Unknown or unsupported binding.
    #[error("unsupported binding: {0}")]
    UnsupportedBinding(String),

    /// A URI or alias that does not name a supported value.
    #[error("unsupported {kind}: {value}")]
    UnsupportedUri {
        /// What was being parsed (binding, name ID format, ...).
        kind: &'static str,
        /// The offending value.
        value: String,
    },

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(#[from] std::io::Error),

    /// Decoded payload is not UTF-8.
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(#[from] sp_crypto::CryptoError),

    /// Deployment defect: required capability or trust material is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<roxmltree::Error> for SamlError {
    fn from(err: roxmltree::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

/// Coarse classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed encoding or XML. Fatal to the message.
    Structural,
    /// The message is well formed but not acceptable. The login attempt is rejected.
    Trust,
    /// The deployment lacks material needed to decide. Should be fixed by an operator.
    Configuration,
}

/// A single failed validation rule, with the context needed to explain it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The binding field carrying the response was absent.
    #[error("SAML response not found")]
    ResponseNotFound,

    /// The response could not be decoded or parsed.
    #[error("malformed SAML response: {0}")]
    Malformed(String),

    /// Response issuer differs from the configured IdP.
    #[error("invalid issuer: expected {expected}, got {}", display_opt(.actual))]
    IssuerMismatch {
        /// Configured IdP entity id.
        expected: String,
        /// Issuer found in the response.
        actual: Option<String>,
    },

    /// Response destination differs from the ACS URL.
    #[error("invalid destination: expected {expected}, got {actual}")]
    DestinationMismatch {
        /// Configured ACS URL.
        expected: String,
        /// Destination found in the response.
        actual: String,
    },

    /// Top-level status is not success.
    #[error("response status is {code}{}", status_suffix(.message))]
    StatusNotSuccess {
        /// Status code URI (including any second-level code).
        code: String,
        /// Optional human-readable status message.
        message: Option<String>,
    },

    /// Response does not answer the request issued by this session.
    #[error("InResponseTo mismatch: expected {expected}, got {}", display_opt(.actual))]
    InResponseToMismatch {
        /// Identifier of the request issued by this session.
        expected: String,
        /// Identifier found in the response.
        actual: Option<String>,
    },

    /// Assertion issuer differs from the configured IdP.
    #[error("invalid assertion issuer: expected {expected}, got {}", display_opt(.actual))]
    AssertionIssuerMismatch {
        /// Configured IdP entity id.
        expected: String,
        /// Issuer found in the assertion.
        actual: Option<String>,
    },

    /// Assertion is not valid yet.
    #[error("assertion not yet valid: NotBefore {} is after {}", fmt_instant(.not_before), fmt_instant(.now))]
    NotYetValid {
        /// Declared start of validity.
        not_before: DateTime<Utc>,
        /// Validation instant.
        now: DateTime<Utc>,
    },

    /// Assertion validity has ended.
    #[error("assertion expired: NotOnOrAfter {} is not after {}", fmt_instant(.not_on_or_after), fmt_instant(.now))]
    Expired {
        /// Declared end of validity (exclusive).
        not_on_or_after: DateTime<Utc>,
        /// Validation instant.
        now: DateTime<Utc>,
    },

    /// Assertion is restricted to audiences that exclude this SP.
    #[error("audience mismatch: {expected} not in [{}]", .audiences.join(", "))]
    AudienceMismatch {
        /// SP entity id.
        expected: String,
        /// Audiences listed in the assertion.
        audiences: Vec<String>,
    },

    /// No assertion although policy requires one.
    #[error("response contains no assertion")]
    MissingAssertion,

    /// Signature verification failed.
    #[error("signature validation failed: {0}")]
    Signature(SignatureError),

    /// Message identifier was already consumed.
    #[error("replayed message: {id} has already been used")]
    Replay {
        /// Assertion or response identifier.
        id: String,
    },

    /// Replay store could not be consulted.
    #[error("replay store unavailable: {0}")]
    ReplayStore(String),

    /// The SP is not configured to validate responses.
    #[error("SP configuration error: {0}")]
    Configuration(String),
}

impl ValidationError {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResponseNotFound | Self::Malformed(_) => ErrorKind::Structural,
            Self::Signature(err) => err.kind(),
            Self::ReplayStore(_) | Self::Configuration(_) => ErrorKind::Configuration,
            _ => ErrorKind::Trust,
        }
    }
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<none>")
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

fn fmt_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_error_includes_code_and_message() {
        let err = ValidationError::StatusNotSuccess {
            code: "urn:oasis:names:tc:SAML:2.0:status:Responder".to_string(),
            message: Some("backend down".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("Responder"));
        assert!(text.ends_with(": backend down"));
        assert_eq!(err.kind(), ErrorKind::Trust);
    }

    #[test]
    fn missing_issuer_renders_placeholder() {
        let err = ValidationError::IssuerMismatch {
            expected: "https://idp.example.com".to_string(),
            actual: None,
        };
        assert_eq!(
            err.to_string(),
            "invalid issuer: expected https://idp.example.com, got <none>"
        );
    }

    #[test]
    fn expiry_renders_instants() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = ValidationError::Expired {
            not_on_or_after: at,
            now: at,
        };
        assert_eq!(
            err.to_string(),
            "assertion expired: NotOnOrAfter 2024-01-01T00:00:00Z is not after 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ValidationError::ResponseNotFound.kind(), ErrorKind::Structural);
        assert_eq!(
            ValidationError::Malformed("x".to_string()).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            ValidationError::Signature(SignatureError::NoTrustAnchor).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ValidationError::Signature(SignatureError::DigestMismatch).kind(),
            ErrorKind::Trust
        );
        assert_eq!(
            ValidationError::Replay { id: "_a".to_string() }.kind(),
            ErrorKind::Trust
        );
        assert_eq!(
            ValidationError::Configuration("bad certificate".to_string()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn xml_errors_convert() {
        let err: SamlError = roxmltree::Document::parse("<a>").unwrap_err().into();
        assert!(matches!(err, SamlError::XmlParse(_)));
    }
}
