//! Parsed inbound SAML response.

use chrono::{DateTime, Utc};

use super::{Assertion, Status};
use crate::error::ValidationError;

/// A decoded `samlp:Response` and its validation outcome.
///
/// Created by the response parser. Only the validator settles `errors` and
/// the validity flag; everything else is fixed at parse time.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    /// Response `ID`.
    pub id: Option<String>,

    /// `InResponseTo` attribute.
    pub in_response_to: Option<String>,

    /// Response issuer.
    pub issuer: Option<String>,

    /// `Destination` attribute.
    pub destination: Option<String>,

    /// `IssueInstant` attribute.
    pub issue_instant: Option<DateTime<Utc>>,

    /// Response status.
    pub status: Option<Status>,

    /// The top-level assertion, if present.
    pub assertion: Option<Assertion>,

    raw: Option<String>,
    errors: Vec<ValidationError>,
    valid: bool,
}

impl ParsedResponse {
    /// A response that failed before any field could be read.
    #[must_use]
    pub fn failed(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Creates an empty response backed by the decoded document.
    #[must_use]
    pub fn from_raw(raw: String) -> Self {
        Self {
            raw: Some(raw),
            ..Self::default()
        }
    }

    /// The decoded XML document, if decoding got that far.
    #[must_use]
    pub fn raw_xml(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Validation errors in the order they were recorded.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Whether every validation rule passed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the status is success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_ref().is_some_and(Status::is_success)
    }

    pub(crate) fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub(crate) fn mark_valid(&mut self) {
        self.valid = self.errors.is_empty();
    }
}
