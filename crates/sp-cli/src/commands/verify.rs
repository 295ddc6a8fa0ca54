//! Response verification command.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sp_protocol_saml::bindings::encode_post;
use sp_protocol_saml::session::SAML_RESPONSE_PARAM;
use sp_protocol_saml::{parse_instant, AuthSession, AuthSessionController, RequestContext, SamlSettings};

use crate::output::{error, field, json, success, OutputFormat};
use crate::CliError;

#[derive(Debug, Serialize)]
struct VerifyReport {
    valid: bool,
    response_id: Option<String>,
    issuer: Option<String>,
    name_id: Option<String>,
    session_index: Option<String>,
    attributes: BTreeMap<String, Vec<String>>,
    errors: Vec<String>,
}

/// Parses and validates a captured response.
///
/// Exits with [`CliError::Rejected`] when the response does not validate.
pub fn run_verify_response(
    settings: SamlSettings,
    path: &Path,
    request_id: Option<&str>,
    at: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let content = std::fs::read_to_string(path)?;
    let now = match at {
        Some(value) => parse_instant(value)
            .ok_or_else(|| CliError::InvalidArgument(format!("not an instant: {value}")))?,
        None => Utc::now(),
    };

    let controller = AuthSessionController::new(settings)?;
    let report = verify(&controller, &content, request_id, now);

    match format {
        OutputFormat::Json => json(&report)?,
        OutputFormat::Text => {
            if report.valid {
                success("response accepted");
                field("name id", report.name_id.as_deref().unwrap_or("-"));
                for (name, values) in &report.attributes {
                    field(name, &values.join(", "));
                }
            } else {
                for message in &report.errors {
                    error(message);
                }
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(CliError::Rejected)
    }
}

fn verify(
    controller: &AuthSessionController,
    content: &str,
    request_id: Option<&str>,
    now: DateTime<Utc>,
) -> VerifyReport {
    let content = content.trim();
    let encoded = if content.starts_with('<') {
        encode_post(content)
    } else {
        content.to_string()
    };

    let acs = &controller.settings().sp.assertion_consumer_service.url;
    let context = RequestContext::new(acs.scheme(), acs.host_str().unwrap_or_default(), acs.path())
        .with_post(SAML_RESPONSE_PARAM, encoded);
    let mut session = AuthSession::new(context);
    if let Some(id) = request_id {
        session.set_last_request_id(id);
    }

    let valid = controller.process_response_at(&mut session, now);
    let response = session.last_response();
    VerifyReport {
        valid,
        response_id: response.and_then(|r| r.id.clone()),
        issuer: response.and_then(|r| r.issuer.clone()),
        name_id: session.name_id().map(str::to_string),
        session_index: session.session_index().map(str::to_string),
        attributes: session.attributes().clone(),
        errors: session.errors(),
    }
}
