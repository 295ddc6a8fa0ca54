//! Trust validation of parsed responses.
//!
//! Rules run in a fixed order and stop at the first failure. The failing
//! rule's error is appended to the response; errors recorded earlier (for
//! example by the parser) stay in place.
//!
//! 1. no structural errors from parsing
//! 2. response issuer, then destination
//! 3. top-level status is success
//! 4. `InResponseTo` matches the request this session issued
//! 5. assertion issuer, validity window and audience
//! 6. an assertion is present when signed assertions are required
//! 7. required signatures verify
//! 8. the message ID has not been consumed before (with a replay cache)

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sp_cache::ReplayCache;
use url::Url;

use crate::config::SamlSettings;
use crate::error::{ErrorKind, SamlResult, ValidationError};
use crate::signature::{SignatureError, SignatureScope, SignatureVerifier};
use crate::types::ParsedResponse;
use crate::xml;

/// Applies the configured trust rules to a [`ParsedResponse`].
pub struct AssertionValidator<'a> {
    settings: &'a SamlSettings,
    verifier: SignatureVerifier,
    replay_cache: Option<&'a dyn ReplayCache>,
}

impl<'a> AssertionValidator<'a> {
    /// Creates a validator for the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured IdP certificate does not decode.
    pub fn new(settings: &'a SamlSettings) -> SamlResult<Self> {
        Ok(Self {
            settings,
            verifier: SignatureVerifier::for_idp(&settings.idp, &settings.security)?,
            replay_cache: None,
        })
    }

    /// Enables the replay rule.
    #[must_use]
    pub fn with_replay_cache(mut self, cache: &'a dyn ReplayCache) -> Self {
        self.replay_cache = Some(cache);
        self
    }

    /// Validates `response` against the current time.
    ///
    /// Returns whether the response is valid; errors are recorded on the
    /// response itself.
    pub fn validate(&self, response: &mut ParsedResponse, expected_request_id: Option<&str>) -> bool {
        self.validate_at(response, expected_request_id, Utc::now())
    }

    /// Validates `response` as of `now`.
    pub fn validate_at(
        &self,
        response: &mut ParsedResponse,
        expected_request_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if !response.errors().is_empty() {
            tracing::debug!("skipping validation of structurally invalid response");
            return false;
        }

        match self.check(response, expected_request_id, now) {
            Ok(()) => {
                response.mark_valid();
                tracing::info!(
                    response_id = response.id.as_deref().unwrap_or("-"),
                    issuer = response.issuer.as_deref().unwrap_or("-"),
                    "SAML response accepted"
                );
            }
            Err(err) => {
                match err.kind() {
                    ErrorKind::Configuration => tracing::error!("SAML validation cannot run: {err}"),
                    ErrorKind::Trust => tracing::warn!(
                        response_id = response.id.as_deref().unwrap_or("-"),
                        "SAML response rejected: {err}"
                    ),
                    ErrorKind::Structural => tracing::debug!("SAML response malformed: {err}"),
                }
                response.push_error(err);
            }
        }
        response.is_valid()
    }

    fn check(
        &self,
        response: &ParsedResponse,
        expected_request_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        self.check_envelope(response)?;
        check_status(response)?;
        check_in_response_to(response, expected_request_id)?;
        self.check_assertion(response, now)?;
        if response.assertion.is_none() && self.settings.security.want_assertions_signed {
            return Err(ValidationError::MissingAssertion);
        }
        self.check_signatures(response)?;
        self.check_replay(response, now)
    }

    fn check_envelope(&self, response: &ParsedResponse) -> Result<(), ValidationError> {
        let expected = &self.settings.idp.entity_id;
        if response.issuer.as_deref() != Some(expected.as_str()) {
            return Err(ValidationError::IssuerMismatch {
                expected: expected.clone(),
                actual: response.issuer.clone(),
            });
        }

        let acs = &self.settings.sp.assertion_consumer_service.url;
        if let Some(destination) = response.destination.as_deref() {
            let matches = Url::parse(destination).is_ok_and(|d| &d == acs) || destination == acs.as_str();
            if !matches {
                return Err(ValidationError::DestinationMismatch {
                    expected: acs.to_string(),
                    actual: destination.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_assertion(&self, response: &ParsedResponse, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let Some(assertion) = &response.assertion else {
            return Ok(());
        };

        let expected = &self.settings.idp.entity_id;
        if assertion.issuer.as_deref() != Some(expected.as_str()) {
            return Err(ValidationError::AssertionIssuerMismatch {
                expected: expected.clone(),
                actual: assertion.issuer.clone(),
            });
        }

        let skew = i64::try_from(self.settings.security.clock_skew_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(TimeDelta::zero);
        if let Some(not_before) = assertion.not_before {
            if not_before.signed_duration_since(now) > skew {
                return Err(ValidationError::NotYetValid { not_before, now });
            }
        }
        if let Some(not_on_or_after) = assertion.not_on_or_after {
            if now.signed_duration_since(not_on_or_after) >= skew {
                return Err(ValidationError::Expired { not_on_or_after, now });
            }
        }

        let sp_entity = &self.settings.sp.entity_id;
        if !assertion.audiences.is_empty() && !assertion.audiences.contains(sp_entity) {
            return Err(ValidationError::AudienceMismatch {
                expected: sp_entity.clone(),
                audiences: assertion.audiences.clone(),
            });
        }
        Ok(())
    }

    fn check_signatures(&self, response: &ParsedResponse) -> Result<(), ValidationError> {
        let policy = &self.settings.security;
        if !policy.requires_signature() {
            return Ok(());
        }

        let raw = response
            .raw_xml()
            .ok_or_else(|| ValidationError::Malformed("raw document unavailable".to_string()))?;
        let doc = xml::parse(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        if policy.want_response_signed {
            self.verifier
                .verify_document(&doc, SignatureScope::Response)
                .map_err(ValidationError::Signature)?;
        }

        if policy.want_assertions_signed {
            match self.verifier.verify_document(&doc, SignatureScope::Assertion) {
                Ok(_) => {}
                // a verified envelope signature covers the assertion it contains
                Err(SignatureError::NotFound(_)) => {
                    match self.verifier.verify_document(&doc, SignatureScope::Response) {
                        Ok(_) => {}
                        Err(SignatureError::NotFound(_)) => {
                            return Err(ValidationError::Signature(SignatureError::NotFound(
                                SignatureScope::Assertion,
                            )));
                        }
                        Err(e) => return Err(ValidationError::Signature(e)),
                    }
                }
                Err(e) => return Err(ValidationError::Signature(e)),
            }
        }
        Ok(())
    }

    fn check_replay(&self, response: &ParsedResponse, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let Some(cache) = self.replay_cache else {
            return Ok(());
        };
        let assertion = response.assertion.as_ref();
        let Some(id) = assertion.and_then(|a| a.id.as_deref()).or(response.id.as_deref()) else {
            tracing::debug!("response carries no ID to record");
            return Ok(());
        };

        let minimum = Duration::from_secs(self.settings.security.replay_ttl_seconds);
        let remaining = assertion
            .and_then(|a| a.not_on_or_after)
            .and_then(|end| end.signed_duration_since(now).to_std().ok())
            .unwrap_or_default();

        match cache.insert_if_absent(id, remaining.max(minimum)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ValidationError::Replay { id: id.to_string() }),
            Err(e) => Err(ValidationError::ReplayStore(e.to_string())),
        }
    }
}

fn check_status(response: &ParsedResponse) -> Result<(), ValidationError> {
    match &response.status {
        Some(status) if status.is_success() => Ok(()),
        Some(status) => Err(ValidationError::StatusNotSuccess {
            code: status.describe_code(),
            message: status.message.clone(),
        }),
        None => Err(ValidationError::Malformed("missing Status".to_string())),
    }
}

fn check_in_response_to(response: &ParsedResponse, expected: Option<&str>) -> Result<(), ValidationError> {
    let Some(expected) = expected.filter(|e| !e.is_empty()) else {
        return Ok(());
    };
    if response.in_response_to.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(ValidationError::InResponseToMismatch {
            expected: expected.to_string(),
            actual: response.in_response_to.clone(),
        })
    }
}
