//! Signature policy and trust anchors, end to end.

use sp_protocol_saml::certificate;
use sp_protocol_saml::types::parse_instant;
use sp_protocol_saml::{AuthSessionController, ErrorKind, SignatureError, ValidationError};

use crate::common::{acs_session, fixture, settings, IdpSimulator, ResponseSpec};

fn fixture_instant() -> chrono::DateTime<chrono::Utc> {
    parse_instant("2024-06-01T12:00:00Z").expect("instant")
}

/// The externally signed fixture validates against the configured certificate.
#[test]
fn test_fixture_response_validates() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut session = acs_session(&fixture("response-signed-assertion.xml"), Some("_req1"));

    assert!(controller.process_response_at(&mut session, fixture_instant()));
    assert_eq!(
        session.attribute("groups"),
        Some(&["admins".to_string(), "staff & friends".to_string()][..])
    );
    Ok(())
}

/// Altering signed content breaks the reference digest.
#[test]
fn test_tampered_attribute_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let tampered = fixture("response-signed-assertion.xml").replace(">admins<", ">root<");
    let mut session = acs_session(&tampered, Some("_req1"));

    assert!(!controller.process_response_at(&mut session, fixture_instant()));
    assert_eq!(
        session.validation_errors(),
        &[ValidationError::Signature(SignatureError::DigestMismatch)]
    );
    Ok(())
}

/// A response signed by an untrusted key fails even with an embedded certificate.
#[test]
fn test_rogue_signer_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let rogue = IdpSimulator::with_key(&fixture("rogue.key"), &fixture("rogue.crt"));
    let xml = rogue.response(&ResponseSpec::success(None))?;
    let mut session = acs_session(&xml, None);

    assert!(!controller.process_response(&mut session));
    let [ValidationError::Signature(err)] = session.validation_errors() else {
        anyhow::bail!("expected a signature error, got {:?}", session.errors());
    };
    assert_eq!(err, &SignatureError::InvalidSignature);
    Ok(())
}

/// A fingerprint trust anchor accepts the embedded certificate it names.
#[test]
fn test_fingerprint_trust_anchor() -> anyhow::Result<()> {
    let mut s = settings();
    s.idp.certificate_fingerprint = Some(certificate::fingerprint(&fixture("idp.crt"), sp_crypto::HashAlgorithm::Sha256)?);
    s.idp.certificate = None;
    let controller = AuthSessionController::new(s)?;

    let xml = IdpSimulator::new().response(&ResponseSpec::success(None))?;
    assert!(controller.process_response(&mut acs_session(&xml, None)));

    let rogue = IdpSimulator::with_key(&fixture("rogue.key"), &fixture("rogue.crt"));
    let xml = rogue.response(&ResponseSpec::success(None))?;
    let mut session = acs_session(&xml, None);
    assert!(!controller.process_response(&mut session));
    assert!(matches!(
        session.validation_errors(),
        [ValidationError::Signature(SignatureError::UntrustedCertificate)]
    ));
    Ok(())
}

/// Required envelope signatures are enforced.
#[test]
fn test_response_signature_policy() -> anyhow::Result<()> {
    let mut s = settings();
    s.security.want_response_signed = true;
    let controller = AuthSessionController::new(s)?;
    let idp = IdpSimulator::new();

    let unsigned_envelope = idp.response(&ResponseSpec::success(None))?;
    let mut session = acs_session(&unsigned_envelope, None);
    assert!(!controller.process_response(&mut session));
    assert_eq!(session.validation_errors()[0].kind(), ErrorKind::Trust);

    let mut spec = ResponseSpec::success(None);
    spec.sign_response = true;
    let signed_envelope = idp.response(&spec)?;
    let mut session = acs_session(&signed_envelope, None);
    assert!(controller.process_response(&mut session), "errors: {:?}", session.errors());
    Ok(())
}

/// An unsigned response never passes when signed assertions are required.
#[test]
fn test_unsigned_response_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut spec = ResponseSpec::success(None);
    spec.sign_assertion = false;
    let xml = IdpSimulator::new().response(&spec)?;
    let mut session = acs_session(&xml, None);

    assert!(!controller.process_response(&mut session));
    assert!(matches!(
        session.validation_errors(),
        [ValidationError::Signature(SignatureError::NotFound(_))]
    ));
    Ok(())
}

/// An injected second assertion next to the signed one is refused outright.
#[test]
fn test_injected_assertion_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let original = fixture("response-signed-assertion.xml");
    let evil = concat!(
        r#"<saml:Assertion ID="_evil" Version="2.0" IssueInstant="2024-01-01T00:00:00Z">"#,
        "<saml:Issuer>https://idp.example.com</saml:Issuer>",
        "<saml:Subject><saml:NameID>admin@example.com</saml:NameID></saml:Subject>",
        "</saml:Assertion>"
    );
    let injected = original.replacen("<saml:Assertion ", &format!("{evil}<saml:Assertion "), 1);
    let mut session = acs_session(&injected, Some("_req1"));

    assert!(!controller.process_response_at(&mut session, fixture_instant()));
    assert_eq!(session.validation_errors()[0].kind(), ErrorKind::Structural);
    assert!(session.name_id().is_none());
    Ok(())
}

/// The EC fixture carries only an envelope signature, which covers its assertion.
#[test]
fn test_ec_envelope_signature() -> anyhow::Result<()> {
    let mut s = settings();
    s.idp.certificate = Some(fixture("idp-ec.crt"));
    s.security.want_response_signed = true;
    let controller = AuthSessionController::new(s)?;

    let mut session = acs_session(&fixture("response-signed-envelope-ec.xml"), Some("_req2"));
    assert!(controller.process_response_at(&mut session, fixture_instant()), "errors: {:?}", session.errors());
    Ok(())
}
