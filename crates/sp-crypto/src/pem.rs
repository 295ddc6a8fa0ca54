//! PEM armor decoding.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{CryptoError, CryptoResult};

/// Decodes PEM text into DER bytes.
///
/// Armor lines (`-----BEGIN ...-----` / `-----END ...-----`) are optional and
/// any whitespace in the body is ignored, so a bare base64 blob as found in
/// `ds:X509Certificate` decodes the same way as a file on disk.
///
/// ## Errors
///
/// Returns [`CryptoError::InvalidKey`] when the body is empty or not base64.
pub fn decode_pem(input: &str) -> CryptoResult<Vec<u8>> {
    let body: String = input
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();

    if body.is_empty() {
        return Err(CryptoError::InvalidKey("empty PEM body".to_string()));
    }

    STANDARD
        .decode(body.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(format!("invalid PEM body: {e}")))
}
