//! Outbound request construction.
//!
//! [`AuthnRequestBuilder`] starts a login, [`LogoutRequestBuilder`] starts an
//! SP-initiated logout. Both encode for the binding of the IdP endpoint they
//! target and sign when the security policy asks for it: a query-string
//! signature on the redirect binding, an enveloped XML signature on POST.

use chrono::{SubsecRound, Utc};
use sp_crypto::generate_message_id;

use crate::bindings::{HttpPostBinding, HttpRedirectBinding, SamlMessageType, Transport};
use crate::config::{Endpoint, SamlSettings};
use crate::error::{SamlError, SamlResult};
use crate::signature::XmlSigner;
use crate::types::{AuthnRequest, LogoutRequest, NameId, NameIdPolicy, SamlBinding};

/// Builds and encodes `AuthnRequest`s.
#[derive(Debug)]
pub struct AuthnRequestBuilder<'a> {
    settings: &'a SamlSettings,
    signer: Option<XmlSigner>,
}

impl<'a> AuthnRequestBuilder<'a> {
    /// Creates a builder.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] when request signing is enabled
    /// but the SP key is missing or unusable.
    pub fn new(settings: &'a SamlSettings) -> SamlResult<Self> {
        let signer = if settings.security.sign_requests {
            Some(signer_for(settings, "request")?)
        } else {
            None
        };
        Ok(Self { settings, signer })
    }

    /// Creates a request with a fresh identifier, issued now.
    #[must_use]
    pub fn build(&self, force_authn: bool, is_passive: bool, include_name_id_policy: bool) -> AuthnRequest {
        let sp = &self.settings.sp;
        let request = AuthnRequest {
            id: generate_message_id(),
            issue_instant: Utc::now().trunc_subsecs(0),
            destination: self.settings.idp.single_sign_on_service.url.to_string(),
            issuer: sp.entity_id.clone(),
            assertion_consumer_service_url: sp.assertion_consumer_service.url.to_string(),
            protocol_binding: sp.assertion_consumer_service.binding,
            force_authn,
            is_passive,
            name_id_policy: include_name_id_policy.then(|| NameIdPolicy::allow_create(sp.name_id_format)),
        };
        tracing::info!(
            request_id = %request.id,
            destination = %request.destination,
            "created AuthnRequest"
        );
        request
    }

    /// Encodes `request` as an HTTP-Redirect URL.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or signing fails.
    pub fn to_redirect_url(&self, request: &AuthnRequest, relay_state: Option<&str>) -> SamlResult<String> {
        redirect(&request.to_xml(), &request.destination, relay_state, self.signer.as_ref())
    }

    /// Encodes `request` as a self-submitting HTML form.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn to_post_form(&self, request: &AuthnRequest, relay_state: Option<&str>) -> SamlResult<String> {
        post_form(&request.to_xml(), &request.destination, relay_state, self.signer.as_ref())
    }

    /// Encodes `request` for the binding of the IdP SSO endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails.
    pub fn to_transport(&self, request: &AuthnRequest, relay_state: Option<&str>) -> SamlResult<Transport> {
        match self.settings.idp.single_sign_on_service.binding {
            SamlBinding::HttpRedirect => self.to_redirect_url(request, relay_state).map(Transport::Redirect),
            SamlBinding::HttpPost => self.to_post_form(request, relay_state).map(Transport::PostForm),
        }
    }
}

/// Builds and encodes `LogoutRequest`s.
#[derive(Debug)]
pub struct LogoutRequestBuilder<'a> {
    settings: &'a SamlSettings,
    endpoint: &'a Endpoint,
    signer: Option<XmlSigner>,
}

impl<'a> LogoutRequestBuilder<'a> {
    /// Creates a builder.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] when the IdP has no logout
    /// endpoint, or when logout signing is enabled without a usable key.
    pub fn new(settings: &'a SamlSettings) -> SamlResult<Self> {
        let endpoint = settings.idp.single_logout_service.as_ref().ok_or_else(|| {
            tracing::error!("logout requested but no IdP single logout service is configured");
            SamlError::Configuration("no IdP single logout service configured".to_string())
        })?;
        let signer = if settings.security.sign_logout_requests {
            Some(signer_for(settings, "logout request")?)
        } else {
            None
        };
        Ok(Self {
            settings,
            endpoint,
            signer,
        })
    }

    /// Creates a logout request for `name_id`.
    #[must_use]
    pub fn build(&self, name_id: NameId, session_index: Option<String>) -> LogoutRequest {
        let request = LogoutRequest {
            id: generate_message_id(),
            issue_instant: Utc::now().trunc_subsecs(0),
            destination: self.endpoint.url.to_string(),
            issuer: self.settings.sp.entity_id.clone(),
            name_id,
            session_index,
        };
        tracing::info!(request_id = %request.id, "created LogoutRequest");
        request
    }

    /// Encodes `request` for the binding of the IdP logout endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails.
    pub fn to_transport(&self, request: &LogoutRequest, relay_state: Option<&str>) -> SamlResult<Transport> {
        let xml = request.to_xml();
        match self.endpoint.binding {
            SamlBinding::HttpRedirect => {
                redirect(&xml, &request.destination, relay_state, self.signer.as_ref()).map(Transport::Redirect)
            }
            SamlBinding::HttpPost => {
                post_form(&xml, &request.destination, relay_state, self.signer.as_ref()).map(Transport::PostForm)
            }
        }
    }
}

fn signer_for(settings: &SamlSettings, what: &str) -> SamlResult<XmlSigner> {
    XmlSigner::for_sp(&settings.sp, &settings.security).map_err(|e| {
        tracing::error!("{what} signing is enabled but the SP key is unusable: {e}");
        match e {
            SamlError::Configuration(_) => e,
            other => SamlError::Configuration(format!("SP signing key: {other}")),
        }
    })
}

fn redirect(xml: &str, destination: &str, relay_state: Option<&str>, signer: Option<&XmlSigner>) -> SamlResult<String> {
    match signer {
        Some(signer) => HttpRedirectBinding::encode_signed(xml, destination, relay_state, SamlMessageType::Request, signer),
        None => HttpRedirectBinding::encode_request(xml, destination, relay_state),
    }
}

fn post_form(xml: &str, destination: &str, relay_state: Option<&str>, signer: Option<&XmlSigner>) -> SamlResult<String> {
    let xml = match signer {
        Some(signer) => signer.sign(xml)?,
        None => xml.to_string(),
    };
    Ok(HttpPostBinding::encode_request(&xml, destination, relay_state))
}
