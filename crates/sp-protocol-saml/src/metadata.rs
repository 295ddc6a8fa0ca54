//! SP metadata.
//!
//! Generates the SAML 2.0 `EntityDescriptor` an IdP imports to trust this
//! service provider.

use base64::Engine;

use crate::certificate::pem_to_der;
use crate::config::SamlSettings;
use crate::error::SamlResult;
use crate::types::{MD_NS, SAMLP_NS, XMLDSIG_NS};
use crate::xml::{escape_attr, escape_text};

/// SP metadata generator.
pub struct SpMetadata;

impl SpMetadata {
    /// Generates SP metadata XML.
    ///
    /// The output depends only on `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured SP certificate does not decode.
    pub fn generate(settings: &SamlSettings) -> SamlResult<String> {
        let sp = &settings.sp;

        let key_descriptor = match sp.certificate.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(pem) => {
                let certificate_b64 = base64::engine::general_purpose::STANDARD.encode(pem_to_der(pem)?);
                format!(
                    r#"
        <md:KeyDescriptor use="signing">
            <ds:KeyInfo xmlns:ds="{XMLDSIG_NS}">
                <ds:X509Data>
                    <ds:X509Certificate>{certificate_b64}</ds:X509Certificate>
                </ds:X509Data>
            </ds:KeyInfo>
        </md:KeyDescriptor>"#
                )
            }
            None => String::new(),
        };

        let single_logout = sp
            .single_logout_service
            .as_ref()
            .map(|slo| {
                format!(
                    r#"
        <md:SingleLogoutService Binding="{}" Location="{}"/>"#,
                    slo.binding.uri(),
                    escape_attr(slo.url.as_str())
                )
            })
            .unwrap_or_default();

        let metadata = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="{MD_NS}" entityID="{entity_id}">
    <md:SPSSODescriptor AuthnRequestsSigned="{requests_signed}" WantAssertionsSigned="{assertions_signed}" protocolSupportEnumeration="{SAMLP_NS}">{key_descriptor}{single_logout}
        <md:NameIDFormat>{name_id_format}</md:NameIDFormat>
        <md:AssertionConsumerService Binding="{acs_binding}" Location="{acs_url}" index="0" isDefault="true"/>
    </md:SPSSODescriptor>
</md:EntityDescriptor>"#,
            entity_id = escape_attr(&sp.entity_id),
            requests_signed = settings.security.sign_requests,
            assertions_signed = settings.security.want_assertions_signed,
            name_id_format = escape_text(sp.name_id_format.uri()),
            acs_binding = sp.assertion_consumer_service.binding.uri(),
            acs_url = escape_attr(sp.assertion_consumer_service.url.as_str()),
        );

        tracing::info!(entity_id = %sp.entity_id, "generated SP metadata");
        Ok(metadata)
    }
}
