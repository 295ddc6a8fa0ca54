//! SAML bindings implementation.
//!
//! This module implements the SAML 2.0 bindings for message transport:
//!
//! - **HTTP-POST Binding** - Messages are base64-encoded and sent in HTML forms
//! - **HTTP-Redirect Binding** - Messages are deflated, base64-encoded, and URL-encoded
//!
//! # Usage
//!
//! ```rust
//! use sp_protocol_saml::bindings::{decode_redirect, encode_redirect, HttpRedirectBinding};
//!
//! let xml = "<samlp:AuthnRequest/>";
//! assert_eq!(decode_redirect(&encode_redirect(xml).unwrap()).unwrap(), xml);
//!
//! let url = HttpRedirectBinding::encode_request(xml, "https://idp.example.com/sso", Some("/home")).unwrap();
//! assert!(url.starts_with("https://idp.example.com/sso?SAMLRequest="));
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

use std::io::{Read, Write};

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::types::SamlBinding;

/// Upper bound on an inflated redirect payload.
pub const MAX_INFLATED_SIZE: u64 = 1024 * 1024;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// Request message (`AuthnRequest`, `LogoutRequest`).
    Request,
    /// Response message.
    Response,
}

impl SamlMessageType {
    /// Returns the form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

/// Decoded SAML binding message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The message type (request or response).
    pub message_type: SamlMessageType,
    /// The RelayState if present.
    pub relay_state: Option<String>,
    /// The query signature (redirect binding only).
    pub signature: Option<String>,
    /// The query signature algorithm (redirect binding only).
    pub sig_alg: Option<String>,
}

/// An outbound message ready for the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// URL to redirect the browser to.
    Redirect(String),
    /// Self-submitting HTML form to render.
    PostForm(String),
}

impl Transport {
    /// Binding this transport uses.
    #[must_use]
    pub const fn binding(&self) -> SamlBinding {
        match self {
            Self::Redirect(_) => SamlBinding::HttpRedirect,
            Self::PostForm(_) => SamlBinding::HttpPost,
        }
    }

    /// The URL or HTML.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Redirect(s) | Self::PostForm(s) => s,
        }
    }

    /// Consumes the transport, returning the URL or HTML.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Redirect(s) | Self::PostForm(s) => s,
        }
    }
}

/// Redirect-binding encoding: raw DEFLATE, base64, then percent-encoding.
///
/// # Errors
///
/// Returns an error if compression fails.
pub fn encode_redirect(xml: &str) -> SamlResult<String> {
    let compressed = deflate_compress(xml.as_bytes())?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);
    Ok(urlencoding::encode(&encoded).into_owned())
}

/// Reverses [`encode_redirect`].
///
/// A value the web framework has already percent-decoded is accepted too.
///
/// # Errors
///
/// Returns an error for invalid percent-encoding, base64, DEFLATE data or
/// UTF-8, and for payloads inflating past [`MAX_INFLATED_SIZE`].
pub fn decode_redirect(value: &str) -> SamlResult<String> {
    let url_decoded = urlencoding::decode(value)
        .map_err(|e| SamlError::InvalidMessage(format!("URL decode error: {e}")))?;
    let compressed = decode_base64(&url_decoded)?;
    let xml = String::from_utf8(deflate_decompress(&compressed)?)?;
    debug!(bytes = xml.len(), "decoded redirect payload");
    Ok(xml)
}

/// POST-binding encoding: base64 only.
#[must_use]
pub fn encode_post(xml: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(xml)
}

/// Reverses [`encode_post`]. Line breaks inside the base64 are ignored.
///
/// # Errors
///
/// Returns an error for invalid base64 or UTF-8.
pub fn decode_post(value: &str) -> SamlResult<String> {
    let xml = String::from_utf8(decode_base64(value)?)?;
    debug!(bytes = xml.len(), "decoded POST payload");
    Ok(xml)
}

fn decode_base64(value: &str) -> SamlResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompresses DEFLATE data, refusing output past [`MAX_INFLATED_SIZE`].
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decompressed = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_INFLATED_SIZE + 1)
        .read_to_end(&mut decompressed)?;
    if decompressed.len() as u64 > MAX_INFLATED_SIZE {
        return Err(SamlError::InvalidMessage(format!(
            "inflated message exceeds {MAX_INFLATED_SIZE} bytes"
        )));
    }
    Ok(decompressed)
}
