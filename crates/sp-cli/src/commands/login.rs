//! Login URL command.

use serde::Serialize;
use sp_protocol_saml::{AuthSession, AuthSessionController, RequestContext, SamlSettings, Transport};

use crate::output::{info, json, warning, OutputFormat};

#[derive(Debug, Serialize)]
struct LoginReport {
    request_id: Option<String>,
    binding: &'static str,
    transport: String,
}

/// Prints the redirect URL or POST form that starts a login.
pub fn run_login_url(
    settings: SamlSettings,
    relay_state: Option<&str>,
    force_authn: bool,
    passive: bool,
    name_id_policy: bool,
    format: OutputFormat,
) -> crate::CliResult<()> {
    if force_authn && passive {
        warning("--force-authn together with --passive usually makes the IdP fail the request");
    }

    let acs = settings.sp.assertion_consumer_service.url.clone();
    let controller = AuthSessionController::new(settings)?;
    let context = RequestContext::new(acs.scheme(), acs.host_str().unwrap_or_default(), "/");
    let mut session = AuthSession::new(context);

    let transport = controller.login(
        &mut session,
        Some(relay_state.unwrap_or_default()),
        force_authn,
        passive,
        name_id_policy,
    )?;

    let report = LoginReport {
        request_id: session.last_request_id().map(str::to_string),
        binding: transport.binding().uri(),
        transport: transport.as_str().to_string(),
    };

    match format {
        OutputFormat::Json => json(&report)?,
        OutputFormat::Text => {
            if let Some(id) = &report.request_id {
                info(&format!("request ID {id}"));
            }
            match transport {
                Transport::Redirect(url) => println!("{url}"),
                Transport::PostForm(html) => println!("{html}"),
            }
        }
    }
    Ok(())
}
