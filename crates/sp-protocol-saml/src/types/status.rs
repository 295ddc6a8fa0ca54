//! SAML Status types.
//!
//! Status information returned in SAML protocol responses.

use serde::{Deserialize, Serialize};

use super::status_codes;

/// SAML protocol status as read from a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Top-level status code URI.
    pub code: String,

    /// Nested second-level status code URI, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_code: Option<String>,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    /// Creates a status with only a top-level code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            sub_code: None,
            message: None,
        }
    }

    /// Returns whether this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == status_codes::SUCCESS
    }

    /// Top-level code followed by the second-level code, for display.
    #[must_use]
    pub fn describe_code(&self) -> String {
        match &self.sub_code {
            Some(sub) => format!("{} / {sub}", self.code),
            None => self.code.clone(),
        }
    }
}
