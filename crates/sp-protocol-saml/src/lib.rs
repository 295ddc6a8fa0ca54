//! SAML 2.0 Web Browser SSO for service providers.
//!
//! This crate implements the SP side of a SAML login:
//!
//! - **AuthnRequest construction** - Build, sign and encode login requests
//! - **Response parsing** - Decode and read inbound responses and assertions
//! - **Validation** - Issuer, status, correlation, validity window, audience,
//!   signature and replay rules
//! - **XML signature** - Verify and create XML-DSig signatures in-process
//! - **POST and Redirect bindings** - Both encodings, including query signatures
//! - **Single Logout (SLO)** - SP-initiated logout requests
//! - **Metadata** - The SP `EntityDescriptor`
//!
//! # Architecture
//!
//! - [`config`] - Typed SP, IdP and security settings
//! - [`types`] - Core SAML types and data structures
//! - [`bindings`] - POST and Redirect binding codecs
//! - [`certificate`] - PEM handling and fingerprints
//! - [`signature`] - XML signature verification and signing
//! - [`request`] - Outbound `AuthnRequest` and `LogoutRequest` builders
//! - [`parser`] - Inbound response parsing
//! - [`validator`] - Ordered trust rules
//! - [`session`] - Login round-trip orchestration
//! - [`metadata`] - SP metadata generation
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use sp_protocol_saml::{AuthSession, AuthSessionController, RequestContext, SamlSettings};
//!
//! # fn run(settings: SamlSettings, acs_post: RequestContext) -> sp_protocol_saml::SamlResult<()> {
//! let controller = AuthSessionController::new(settings)?;
//!
//! let mut session = AuthSession::new(RequestContext::new("https", "sp.example.com", "/private"));
//! let redirect = controller.login(&mut session, None, false, false, true)?;
//! let request_id = session.last_request_id().map(str::to_string);
//! # let _ = redirect;
//!
//! // later, on the ACS post
//! let mut session = AuthSession::new(acs_post);
//! if let Some(id) = request_id {
//!     session.set_last_request_id(id);
//! }
//! if controller.process_response(&mut session) {
//!     println!("welcome {:?}", session.attribute("email"));
//! } else {
//!     println!("login failed: {:?}", session.errors());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Metadata](https://docs.oasis-open.org/security/saml/v2.0/saml-metadata-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod certificate;
pub mod config;
pub mod error;
pub mod metadata;
pub mod parser;
pub mod request;
pub mod session;
pub mod signature;
pub mod types;
pub mod validator;
pub mod xml;

pub use bindings::Transport;
pub use config::{Endpoint, IdpConfig, SamlSettings, SecurityPolicy, SpConfig};
pub use error::{ErrorKind, SamlError, SamlResult, ValidationError};
pub use metadata::SpMetadata;
pub use parser::ResponseParser;
pub use request::{AuthnRequestBuilder, LogoutRequestBuilder};
pub use session::{AuthSession, AuthSessionController, RequestContext};
pub use signature::{SignatureError, SignatureVerifier, TrustAnchor, XmlSigner};
pub use sp_cache::{InMemoryReplayCache, ReplayCache};
pub use types::*;
pub use validator::AssertionValidator;
