//! Binding payload decoding command.

use serde::Serialize;
use sp_protocol_saml::bindings::{decode_post, decode_redirect, HttpRedirectBinding};

use crate::cli::BindingArg;
use crate::output::{json, OutputFormat};

#[derive(Debug, Serialize)]
struct DecodeReport {
    xml: String,
    relay_state: Option<String>,
    sig_alg: Option<String>,
}

/// Decodes a POST or redirect payload and prints the XML.
pub fn run_decode(value: &str, binding: BindingArg, format: OutputFormat) -> crate::CliResult<()> {
    let report = decode_value(value, binding)?;
    match format {
        OutputFormat::Json => json(&report)?,
        OutputFormat::Text => println!("{}", report.xml),
    }
    Ok(())
}

fn decode_value(value: &str, binding: BindingArg) -> crate::CliResult<DecodeReport> {
    let value = value.trim();
    let report = match binding {
        BindingArg::Post => DecodeReport {
            xml: decode_post(value)?,
            relay_state: None,
            sig_alg: None,
        },
        BindingArg::Redirect if value.contains("://") => {
            let message = HttpRedirectBinding::decode_url(value)?;
            DecodeReport {
                xml: message.xml,
                relay_state: message.relay_state,
                sig_alg: message.sig_alg,
            }
        }
        BindingArg::Redirect => DecodeReport {
            xml: decode_redirect(value)?,
            relay_state: None,
            sig_alg: None,
        },
    };
    Ok(report)
}
