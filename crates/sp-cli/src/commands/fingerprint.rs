//! Certificate fingerprint command.

use std::path::Path;

use serde::Serialize;
use sp_crypto::{CertificateSummary, HashAlgorithm};
use sp_protocol_saml::certificate;

use crate::output::{field, json, OutputFormat};
use crate::CliError;

#[derive(Debug, Serialize)]
struct FingerprintReport {
    algorithm: HashAlgorithm,
    fingerprint: String,
    subject: String,
    issuer: String,
    not_before: String,
    not_after: String,
    key_type: String,
}

/// Prints the fingerprint of a PEM certificate file.
pub fn run_fingerprint(path: &Path, algorithm: &str, format: OutputFormat) -> crate::CliResult<()> {
    let algorithm = HashAlgorithm::from_name(algorithm).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let pem = std::fs::read_to_string(path)?;
    let report = fingerprint_report(&pem, algorithm)?;

    match format {
        OutputFormat::Json => json(&report)?,
        OutputFormat::Text => {
            field("fingerprint", &report.fingerprint);
            field("subject", &report.subject);
            field("issuer", &report.issuer);
            field("valid", &format!("{} .. {}", report.not_before, report.not_after));
            field("key", &report.key_type);
        }
    }
    Ok(())
}

fn fingerprint_report(pem: &str, algorithm: HashAlgorithm) -> crate::CliResult<FingerprintReport> {
    let der = certificate::pem_to_der(pem)?;
    let summary = CertificateSummary::from_der(&der).map_err(sp_protocol_saml::SamlError::from)?;
    Ok(FingerprintReport {
        algorithm,
        fingerprint: certificate::fingerprint_der(&der, algorithm),
        subject: summary.subject,
        issuer: summary.issuer,
        not_before: summary.not_before.to_rfc3339(),
        not_after: summary.not_after.to_rfc3339(),
        key_type: summary.key_type,
    })
}
