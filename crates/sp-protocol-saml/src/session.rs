//! Login round-trip orchestration.
//!
//! An [`AuthSession`] holds the state of one browser round trip: the request
//! context supplied by the HTTP layer, the ID of the request issued on login,
//! and the outcome of processing the IdP's response. Sessions are not shared
//! between requests or users. The host persists
//! [`last_request_id`](AuthSession::last_request_id) between the login
//! redirect and the ACS post and restores it with
//! [`set_last_request_id`](AuthSession::set_last_request_id).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sp_cache::ReplayCache;

use crate::bindings::Transport;
use crate::config::SamlSettings;
use crate::error::{SamlError, SamlResult, ValidationError};
use crate::parser::ResponseParser;
use crate::request::{AuthnRequestBuilder, LogoutRequestBuilder};
use crate::signature::SignatureVerifier;
use crate::types::{Attributes, NameId, ParsedResponse};
use crate::validator::AssertionValidator;

/// Form field carrying an inbound response.
pub const SAML_RESPONSE_PARAM: &str = "SAMLResponse";

/// Form or query field carrying the relay state.
pub const RELAY_STATE_PARAM: &str = "RelayState";

/// The inbound HTTP request, as seen by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// `http` or `https`.
    pub scheme: String,
    /// Host, with port when non-default.
    pub host: String,
    /// Request path.
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
    /// Decoded form parameters.
    pub post: BTreeMap<String, String>,
}

impl RequestContext {
    /// Creates a context with no parameters.
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a form parameter.
    #[must_use]
    pub fn with_post(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.insert(name.into(), value.into());
        self
    }

    /// Reconstructs the URL of the current request.
    #[must_use]
    pub fn current_url(&self) -> String {
        let mut url = format!("{}://{}{}", self.scheme, self.host, self.path);
        if !self.query.is_empty() {
            let query: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

/// State of one login round trip.
#[derive(Debug, Default)]
pub struct AuthSession {
    context: RequestContext,
    last_request_id: Option<String>,
    last_response: Option<ParsedResponse>,
    authenticated: bool,
    attributes: Attributes,
    name_id: Option<NameId>,
    session_index: Option<String>,
    errors: Vec<ValidationError>,
}

impl AuthSession {
    /// Creates a session for the current request.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// The request context.
    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }

    /// ID of the last `AuthnRequest` issued for this session.
    #[must_use]
    pub fn last_request_id(&self) -> Option<&str> {
        self.last_request_id.as_deref()
    }

    /// Restores the ID of a previously issued request.
    pub fn set_last_request_id(&mut self, id: impl Into<String>) {
        self.last_request_id = Some(id.into());
    }

    /// The last processed response.
    #[must_use]
    pub const fn last_response(&self) -> Option<&ParsedResponse> {
        self.last_response.as_ref()
    }

    /// Whether the last processed response authenticated the user.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// All attributes of the authenticated subject.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Values of one attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Subject name identifier value.
    #[must_use]
    pub fn name_id(&self) -> Option<&str> {
        self.name_id.as_ref().map(|n| n.value.as_str())
    }

    /// Subject name identifier format URI.
    #[must_use]
    pub fn name_id_format(&self) -> Option<&str> {
        self.name_id.as_ref().and_then(|n| n.format.as_deref())
    }

    /// IdP session index.
    #[must_use]
    pub fn session_index(&self) -> Option<&str> {
        self.session_index.as_deref()
    }

    /// `RelayState` echoed back by the IdP.
    #[must_use]
    pub fn relay_state(&self) -> Option<&str> {
        self.context
            .post
            .get(RELAY_STATE_PARAM)
            .or_else(|| self.context.query.get(RELAY_STATE_PARAM))
            .map(String::as_str)
    }

    /// Errors from the last processed response, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// The most recent error.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.errors.last().map(ToString::to_string)
    }

    /// Typed errors from the last processed response.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn reset(&mut self) {
        self.last_response = None;
        self.authenticated = false;
        self.attributes.clear();
        self.name_id = None;
        self.session_index = None;
        self.errors.clear();
    }
}

/// Drives login, response processing and logout for a configured SP.
pub struct AuthSessionController {
    settings: SamlSettings,
    replay_cache: Option<Arc<dyn ReplayCache>>,
}

impl std::fmt::Debug for AuthSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionController")
            .field("settings", &self.settings)
            .field("replay_cache", &self.replay_cache.is_some())
            .finish()
    }
}

impl AuthSessionController {
    /// Creates a controller.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if the settings have a deployment
    /// defect.
    pub fn new(settings: SamlSettings) -> SamlResult<Self> {
        let checked = settings
            .validate()
            .and_then(|()| SignatureVerifier::for_idp(&settings.idp, &settings.security).map(drop));
        if let Err(e) = checked {
            tracing::error!("invalid SAML settings: {e}");
            return Err(e);
        }
        Ok(Self {
            settings,
            replay_cache: None,
        })
    }

    /// Enables replay detection.
    #[must_use]
    pub fn with_replay_cache(mut self, cache: Arc<dyn ReplayCache>) -> Self {
        self.replay_cache = Some(cache);
        self
    }

    /// The settings in use.
    #[must_use]
    pub const fn settings(&self) -> &SamlSettings {
        &self.settings
    }

    /// Starts a login.
    ///
    /// The new request's ID is stored on the session. `return_to` becomes the
    /// relay state and defaults to the current URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be encoded or signed.
    pub fn login(
        &self,
        session: &mut AuthSession,
        return_to: Option<&str>,
        force_authn: bool,
        is_passive: bool,
        set_name_id_policy: bool,
    ) -> SamlResult<Transport> {
        let builder = AuthnRequestBuilder::new(&self.settings)?;
        let request = builder.build(force_authn, is_passive, set_name_id_policy);
        let relay_state = return_to.map_or_else(|| session.context.current_url(), str::to_string);
        let transport = builder.to_transport(&request, Some(&relay_state))?;
        session.last_request_id = Some(request.id);
        Ok(transport)
    }

    /// Processes the response posted to the ACS.
    ///
    /// Returns whether the user is now authenticated.
    pub fn process_response(&self, session: &mut AuthSession) -> bool {
        self.process_response_at(session, Utc::now())
    }

    /// Processes the response posted to the ACS, validating as of `now`.
    pub fn process_response_at(&self, session: &mut AuthSession, now: DateTime<Utc>) -> bool {
        session.reset();

        let raw = session.context.post.get(SAML_RESPONSE_PARAM).map(String::as_str);
        let mut response = ResponseParser::parse(raw);

        match AssertionValidator::new(&self.settings) {
            Ok(validator) => {
                let validator = match self.replay_cache.as_deref() {
                    Some(cache) => validator.with_replay_cache(cache),
                    None => validator,
                };
                validator.validate_at(&mut response, session.last_request_id.as_deref(), now);
            }
            Err(e) => {
                tracing::error!("cannot build response validator: {e}");
                response.push_error(ValidationError::Configuration(e.to_string()));
            }
        }

        session.errors = response.errors().to_vec();
        if response.is_valid() {
            if let Some(assertion) = &response.assertion {
                session.attributes = assertion.attributes.clone();
                session.name_id = assertion.name_id.clone();
                session.session_index = assertion.session_index.clone();
            }
            session.authenticated = true;
        }
        session.last_response = Some(response);
        session.authenticated
    }

    /// Starts an SP-initiated logout for the session's subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the session has no subject, the IdP has no logout
    /// endpoint, or encoding fails.
    pub fn logout(&self, session: &AuthSession, relay_state: Option<&str>) -> SamlResult<Transport> {
        let name_id = session
            .name_id
            .clone()
            .ok_or_else(|| SamlError::MissingElement("authenticated subject NameID".to_string()))?;
        let builder = LogoutRequestBuilder::new(&self.settings)?;
        let request = builder.build(name_id, session.session_index.clone());
        builder.to_transport(&request, relay_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{decode_redirect, encode_post};
    use crate::config::{Endpoint, IdpConfig, SpConfig};
    use crate::error::ErrorKind;
    use crate::types::{parse_instant, NameIdFormat, SamlBinding};
    use sp_cache::InMemoryReplayCache;
    use url::Url;

    const SIGNED_ASSERTION: &str = include_str!("../testdata/response-signed-assertion.xml");
    const IDP_CRT: &str = include_str!("../testdata/idp.crt");

    fn settings() -> SamlSettings {
        let sp = SpConfig {
            entity_id: "https://sp.example.com".to_string(),
            assertion_consumer_service: Endpoint::new(
                Url::parse("https://sp.example.com/acs").unwrap(),
                SamlBinding::HttpPost,
            ),
            single_logout_service: None,
            name_id_format: NameIdFormat::Email,
            certificate: None,
            private_key: None,
        };
        let idp = IdpConfig {
            entity_id: "https://idp.example.com".to_string(),
            single_sign_on_service: Endpoint::new(
                Url::parse("https://idp.example.com/sso").unwrap(),
                SamlBinding::HttpRedirect,
            ),
            single_logout_service: Some(Endpoint::new(
                Url::parse("https://idp.example.com/slo").unwrap(),
                SamlBinding::HttpRedirect,
            )),
            certificate: Some(IDP_CRT.to_string()),
            certificate_fingerprint: None,
            fingerprint_algorithm: sp_crypto::HashAlgorithm::Sha256,
        };
        SamlSettings::new(sp, idp)
    }

    fn now() -> DateTime<Utc> {
        parse_instant("2024-06-01T12:00:00Z").unwrap()
    }

    fn acs_session(response: &str) -> AuthSession {
        let context = RequestContext::new("https", "sp.example.com", "/acs")
            .with_post(SAML_RESPONSE_PARAM, encode_post(response))
            .with_post(RELAY_STATE_PARAM, "/dashboard");
        let mut session = AuthSession::new(context);
        session.set_last_request_id("_req1");
        session
    }

    #[test]
    fn unusable_settings_are_reported_as_configuration() {
        let mut broken = settings();
        broken.idp.certificate = Some("-----BEGIN CERTIFICATE-----\n!!!\n-----END CERTIFICATE-----".to_string());
        let controller = AuthSessionController {
            settings: broken,
            replay_cache: None,
        };
        let mut session = acs_session(SIGNED_ASSERTION);

        assert!(!controller.process_response_at(&mut session, now()));
        assert!(matches!(
            session.validation_errors(),
            [ValidationError::Configuration(_)]
        ));
        assert_eq!(session.validation_errors()[0].kind(), ErrorKind::Configuration);
    }

    #[test]
    fn current_url_includes_query() {
        let context = RequestContext::new("https", "sp.example.com", "/app").with_query("tab", "a b");
        assert_eq!(context.current_url(), "https://sp.example.com/app?tab=a%20b");
    }

    #[test]
    fn login_records_request_id() {
        let controller = AuthSessionController::new(settings()).unwrap();
        let mut session = AuthSession::new(RequestContext::new("https", "sp.example.com", "/private"));

        let transport = controller.login(&mut session, None, false, false, true).unwrap();
        let Transport::Redirect(url) = transport else {
            panic!("expected redirect");
        };
        assert!(url.starts_with("https://idp.example.com/sso?SAMLRequest="));
        assert!(url.contains("RelayState=https%3A%2F%2Fsp.example.com%2Fprivate"));

        let id = session.last_request_id().unwrap().to_string();
        let parsed = Url::parse(&url).unwrap();
        let (_, encoded) = parsed.query_pairs().find(|(k, _)| k == "SAMLRequest").unwrap();
        assert!(decode_redirect(&encoded).unwrap().contains(&format!("ID=\"{id}\"")));
    }

    #[test]
    fn successful_response_populates_session() {
        let controller = AuthSessionController::new(settings()).unwrap();
        let mut session = acs_session(SIGNED_ASSERTION);

        assert!(controller.process_response_at(&mut session, now()), "{:?}", session.errors());
        assert!(session.is_authenticated());
        assert!(session.errors().is_empty());
        assert!(session.last_error().is_none());
        assert!(session.name_id().is_some());
        assert!(session.attribute("groups").is_some());
        assert_eq!(session.relay_state(), Some("/dashboard"));
        assert!(session.last_response().is_some_and(ParsedResponse::is_valid));
    }

    #[test]
    fn failure_clears_previous_outcome() {
        let controller = AuthSessionController::new(settings()).unwrap();
        let mut session = acs_session(SIGNED_ASSERTION);
        assert!(controller.process_response_at(&mut session, now()));

        session.context.post.remove(SAML_RESPONSE_PARAM);
        assert!(!controller.process_response_at(&mut session, now()));
        assert!(!session.is_authenticated());
        assert!(session.attributes().is_empty());
        assert!(session.name_id().is_none());
        assert_eq!(session.errors(), vec!["SAML response not found".to_string()]);
        assert_eq!(session.last_error().as_deref(), Some("SAML response not found"));
    }

    #[test]
    fn mismatched_request_id_is_rejected() {
        let controller = AuthSessionController::new(settings()).unwrap();
        let mut session = acs_session(SIGNED_ASSERTION);
        session.set_last_request_id("_someone_else");

        assert!(!controller.process_response_at(&mut session, now()));
        assert!(matches!(
            session.validation_errors(),
            [ValidationError::InResponseToMismatch { .. }]
        ));
    }

    #[test]
    fn replay_cache_blocks_second_use() {
        let controller = AuthSessionController::new(settings())
            .unwrap()
            .with_replay_cache(Arc::new(InMemoryReplayCache::new()));

        assert!(controller.process_response_at(&mut acs_session(SIGNED_ASSERTION), now()));

        let mut again = acs_session(SIGNED_ASSERTION);
        assert!(!controller.process_response_at(&mut again, now()));
        assert!(again.last_error().unwrap().contains("_assert1"));
    }

    #[test]
    fn invalid_settings_are_refused() {
        let mut s = settings();
        s.idp.certificate = None;
        assert!(matches!(
            AuthSessionController::new(s),
            Err(SamlError::Configuration(_))
        ));
    }

    #[test]
    fn logout_requires_subject() {
        let controller = AuthSessionController::new(settings()).unwrap();
        let anonymous = AuthSession::default();
        assert!(controller.logout(&anonymous, None).is_err());

        let mut session = acs_session(SIGNED_ASSERTION);
        assert!(controller.process_response_at(&mut session, now()));
        let Transport::Redirect(url) = controller.logout(&session, Some("/bye")).unwrap() else {
            panic!("expected redirect");
        };
        assert!(url.starts_with("https://idp.example.com/slo?SAMLRequest="));
    }
}
