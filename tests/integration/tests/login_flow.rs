//! Complete login round trips through `AuthSessionController`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sp_protocol_saml::types::status_codes;
use sp_protocol_saml::{
    AuthSession, AuthSessionController, ErrorKind, InMemoryReplayCache, RequestContext, Transport,
    ValidationError,
};

use crate::common::{acs_session, settings, IdpSimulator, ResponseSpec};

fn start_login(controller: &AuthSessionController) -> anyhow::Result<String> {
    let mut session = AuthSession::new(RequestContext::new("https", "sp.example.com", "/private"));
    let transport = controller.login(&mut session, None, false, false, true)?;
    assert!(matches!(transport, Transport::Redirect(_)));
    Ok(session
        .last_request_id()
        .ok_or_else(|| anyhow::anyhow!("login did not record a request ID"))?
        .to_string())
}

/// A signed, in-window success response authenticates the user.
#[test]
fn test_successful_login_exposes_attributes() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let request_id = start_login(&controller)?;

    let xml = IdpSimulator::new().response(&ResponseSpec::success(Some(&request_id)))?;
    let mut session = acs_session(&xml, Some(&request_id));

    assert!(controller.process_response(&mut session), "errors: {:?}", session.errors());
    assert!(session.is_authenticated());
    assert_eq!(session.attribute("email"), Some(&["a@b.com".to_string()][..]));
    assert_eq!(session.name_id(), Some("a@b.com"));
    assert_eq!(
        session.name_id_format(),
        Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
    );
    assert!(session.session_index().is_some_and(|s| s.starts_with("_session-")));
    assert!(session.errors().is_empty());
    Ok(())
}

/// A non-success status is rejected with the status code in the error.
#[test]
fn test_responder_status_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut spec = ResponseSpec::success(None);
    spec.status = status_codes::RESPONDER.to_string();

    let xml = IdpSimulator::new().response(&spec)?;
    let mut session = acs_session(&xml, None);

    assert!(!controller.process_response(&mut session));
    assert!(!session.is_authenticated());
    assert!(!session.errors().is_empty());
    assert!(session.errors().iter().any(|e| e.contains(status_codes::RESPONDER)));
    assert!(session.attributes().is_empty());
    Ok(())
}

/// An absent `SAMLResponse` yields exactly one "not found" error.
#[test]
fn test_missing_response_field() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut session = AuthSession::new(RequestContext::new("https", "sp.example.com", "/acs"));

    assert!(!controller.process_response(&mut session));
    assert_eq!(session.validation_errors(), &[ValidationError::ResponseNotFound]);
    assert_eq!(session.validation_errors()[0].kind(), ErrorKind::Structural);
    Ok(())
}

/// A response from another IdP is rejected on issuer alone.
#[test]
fn test_foreign_issuer_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut spec = ResponseSpec::success(None);
    spec.issuer = "https://evil.example.com".to_string();

    let xml = IdpSimulator::new().response(&spec)?;
    let mut session = acs_session(&xml, None);

    assert!(!controller.process_response(&mut session));
    assert!(matches!(
        session.validation_errors(),
        [ValidationError::IssuerMismatch { .. }]
    ));
    Ok(())
}

/// `NotOnOrAfter` in the past fails the validity window.
#[test]
fn test_expired_assertion_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let mut spec = ResponseSpec::success(None);
    spec.not_before = Utc::now() - Duration::minutes(10);
    spec.not_on_or_after = Utc::now() - Duration::seconds(1);

    let xml = IdpSimulator::new().response(&spec)?;
    let mut session = acs_session(&xml, None);

    assert!(!controller.process_response(&mut session));
    assert!(matches!(session.validation_errors(), [ValidationError::Expired { .. }]));
    Ok(())
}

/// A response answering a different request is rejected.
#[test]
fn test_response_to_other_request_is_rejected() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let request_id = start_login(&controller)?;

    let xml = IdpSimulator::new().response(&ResponseSpec::success(Some("_not-ours")))?;
    let mut session = acs_session(&xml, Some(&request_id));

    assert!(!controller.process_response(&mut session));
    assert!(session.last_error().is_some_and(|e| e.contains("_not-ours")));
    Ok(())
}

/// The same response cannot be consumed twice.
#[test]
fn test_replayed_response_is_rejected() -> anyhow::Result<()> {
    let controller =
        AuthSessionController::new(settings())?.with_replay_cache(Arc::new(InMemoryReplayCache::new()));
    let xml = IdpSimulator::new().response(&ResponseSpec::success(None))?;

    let mut first = acs_session(&xml, None);
    assert!(controller.process_response(&mut first));

    let mut second = acs_session(&xml, None);
    assert!(!controller.process_response(&mut second));
    assert!(matches!(second.validation_errors(), [ValidationError::Replay { .. }]));
    Ok(())
}

/// Logout after login targets the IdP SLO endpoint with the session subject.
#[test]
fn test_logout_after_login() -> anyhow::Result<()> {
    let controller = AuthSessionController::new(settings())?;
    let xml = IdpSimulator::new().response(&ResponseSpec::success(None))?;
    let mut session = acs_session(&xml, None);
    assert!(controller.process_response(&mut session));

    let Transport::Redirect(url) = controller.logout(&session, None)? else {
        anyhow::bail!("expected redirect transport");
    };
    assert!(url.starts_with("https://idp.example.com/slo?SAMLRequest="));
    Ok(())
}
