//! HTTP-Redirect Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-Redirect binding for sending SAML messages
//! via URL query parameters with DEFLATE compression, including the detached
//! query-string signature.

use base64::Engine;
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::signature::{SignatureAlgorithm, SignatureError, SignatureVerifier, XmlSigner};

use super::{decode_redirect, encode_redirect, DecodedMessage, SamlMessageType};

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Encodes a SAML request for HTTP-Redirect binding.
    ///
    /// Returns a URL with the encoded message in query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn encode_request(xml: &str, destination: &str, relay_state: Option<&str>) -> SamlResult<String> {
        Self::encode(xml, destination, relay_state, SamlMessageType::Request)
    }

    /// Encodes a SAML message for HTTP-Redirect binding.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn encode(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        message_type: SamlMessageType,
    ) -> SamlResult<String> {
        let query = message_query(xml, relay_state, message_type)?;
        Ok(format!("{destination}{}{query}", separator(destination)))
    }

    /// Encodes a SAML message with a query-string signature.
    ///
    /// The signature covers `SAMLRequest=..&RelayState=..&SigAlg=..` exactly
    /// as the parameters appear in the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or signing fails.
    pub fn encode_signed(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        message_type: SamlMessageType,
        signer: &XmlSigner,
    ) -> SamlResult<String> {
        let mut query = message_query(xml, relay_state, message_type)?;
        query.push_str("&SigAlg=");
        query.push_str(&urlencoding::encode(signer.algorithm().uri()));

        let signature = signer.sign_data(query.as_bytes())?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);
        query.push_str("&Signature=");
        query.push_str(&urlencoding::encode(&signature_b64));

        Ok(format!("{destination}{}{query}", separator(destination)))
    }

    /// Decodes a message from a full URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, carries no SAML message, or
    /// the payload does not decode.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SamlError::InvalidMessage(format!("Invalid URL: {e}")))?;

        let mut message = None;
        let mut relay_state = None;
        let mut signature = None;
        let mut sig_alg = None;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "SAMLRequest" => message = Some((value.into_owned(), SamlMessageType::Request)),
                "SAMLResponse" => message = Some((value.into_owned(), SamlMessageType::Response)),
                "RelayState" => relay_state = Some(value.into_owned()),
                "Signature" => signature = Some(value.into_owned()),
                "SigAlg" => sig_alg = Some(value.into_owned()),
                _ => {}
            }
        }

        let (encoded, message_type) = message.ok_or_else(|| {
            SamlError::InvalidMessage("No SAMLRequest or SAMLResponse parameter".to_string())
        })?;

        Ok(DecodedMessage {
            xml: decode_redirect(&encoded)?,
            message_type,
            relay_state,
            signature,
            sig_alg,
        })
    }

    /// Verifies the query-string signature of an inbound redirect message.
    ///
    /// `query` is the raw query string (or a full URL). The signed string is
    /// rebuilt from the parameter values exactly as received, since
    /// re-encoding may not reproduce the sender's percent-encoding.
    ///
    /// # Errors
    ///
    /// Returns the reason the signature is not accepted.
    pub fn verify_signature(query: &str, verifier: &SignatureVerifier) -> Result<SignatureAlgorithm, SignatureError> {
        let query = query.split_once('?').map_or(query, |(_, q)| q);

        let mut message = None;
        let mut relay_state = None;
        let mut sig_alg = None;
        let mut signature = None;
        for pair in query.split('&') {
            let (key, _) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "SAMLRequest" | "SAMLResponse" => message = Some(pair),
                "RelayState" => relay_state = Some(pair),
                "SigAlg" => sig_alg = Some(pair),
                "Signature" => signature = Some(pair),
                _ => {}
            }
        }

        let message = message.ok_or_else(|| SignatureError::Malformed("no SAML message in query".to_string()))?;
        let sig_alg = sig_alg.ok_or_else(|| SignatureError::Malformed("SigAlg missing".to_string()))?;
        let signature = signature.ok_or_else(|| SignatureError::Malformed("Signature missing".to_string()))?;

        let mut signed = String::from(message);
        if let Some(rs) = relay_state {
            signed.push('&');
            signed.push_str(rs);
        }
        signed.push('&');
        signed.push_str(sig_alg);

        let alg_uri = query_value(sig_alg)?;
        let signature_b64 = query_value(signature)?;
        let algorithm = verifier.verify_detached(signed.as_bytes(), &alg_uri, &signature_b64)?;
        debug!(algorithm = algorithm.uri(), "redirect query signature verified");
        Ok(algorithm)
    }
}

fn message_query(xml: &str, relay_state: Option<&str>, message_type: SamlMessageType) -> SamlResult<String> {
    let mut query = format!("{}={}", message_type.form_param(), encode_redirect(xml)?);
    if let Some(rs) = relay_state.filter(|rs| !rs.is_empty()) {
        query.push_str("&RelayState=");
        query.push_str(&urlencoding::encode(rs));
    }
    Ok(query)
}

fn separator(destination: &str) -> char {
    if destination.contains('?') {
        '&'
    } else {
        '?'
    }
}

fn query_value(pair: &str) -> Result<String, SignatureError> {
    let raw = pair.split_once('=').map_or("", |(_, v)| v);
    urlencoding::decode(&raw.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SignatureError::Malformed(e.to_string()))
}
