//! Cryptographically secure random generation.
//!
//! Used for protocol message identifiers that peers echo back and that must
//! not be guessable.

use rand::Rng;

/// Number of random bytes behind each message identifier (160 bits).
pub const MESSAGE_ID_ENTROPY_BYTES: usize = 20;

/// Generates a cryptographically secure random byte array.
///
/// Uses the thread-local generator, which is seeded from the OS.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates an identifier suitable for a SAML `ID` attribute.
///
/// XML IDs must not start with a digit, so the hex string carries a leading
/// underscore.
#[must_use]
pub fn generate_message_id() -> String {
    format!("_{}", hex::encode(random_bytes(MESSAGE_ID_ENTROPY_BYTES)))
}
