//! Settings file loading.
//!
//! The settings file is the TOML form of [`SamlSettings`], except that PEM
//! material is referenced by path. Relative paths resolve against the
//! directory holding the settings file.
//!
//! ```toml
//! [sp]
//! entity_id = "https://sp.example.com"
//! name_id_format = "email"
//! certificate_file = "sp.crt"
//! private_key_file = "sp.key"
//!
//! [sp.assertion_consumer_service]
//! url = "https://sp.example.com/acs"
//!
//! [idp]
//! entity_id = "https://idp.example.com"
//! certificate_file = "idp.crt"
//!
//! [idp.single_sign_on_service]
//! url = "https://idp.example.com/sso"
//! binding = "redirect"
//!
//! [security]
//! sign_requests = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sp_crypto::HashAlgorithm;
use sp_protocol_saml::types::NameIdFormat;
use sp_protocol_saml::{Endpoint, IdpConfig, SamlSettings, SecurityPolicy, SpConfig};

use crate::error::{CliError, CliResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    sp: SpSection,
    idp: IdpSection,
    #[serde(default)]
    security: SecurityPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpSection {
    entity_id: String,
    assertion_consumer_service: Endpoint,
    single_logout_service: Option<Endpoint>,
    #[serde(default)]
    name_id_format: NameIdFormat,
    certificate_file: Option<PathBuf>,
    private_key_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdpSection {
    entity_id: String,
    single_sign_on_service: Endpoint,
    single_logout_service: Option<Endpoint>,
    certificate_file: Option<PathBuf>,
    certificate_fingerprint: Option<String>,
    #[serde(default)]
    fingerprint_algorithm: HashAlgorithm,
}

/// Loads and validates a settings file.
///
/// # Errors
///
/// Returns an error if the file or a referenced PEM file cannot be read, the
/// TOML is invalid, or the settings have a deployment defect.
pub fn load_settings(path: &Path) -> CliResult<SamlSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let settings = parse_settings(&content, base_dir)?;
    settings.validate()?;
    tracing::debug!(path = %path.display(), entity_id = %settings.sp.entity_id, "loaded settings");
    Ok(settings)
}

/// Parses settings text, reading referenced PEM files relative to `base_dir`.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or a referenced file cannot be read.
pub fn parse_settings(content: &str, base_dir: &Path) -> CliResult<SamlSettings> {
    let file: SettingsFile =
        toml::from_str(content).map_err(|e| CliError::Config(format!("failed to parse settings: {e}")))?;

    let read = |p: Option<PathBuf>| -> CliResult<Option<String>> {
        p.map(|p| {
            let full = base_dir.join(p);
            std::fs::read_to_string(&full)
                .map_err(|e| CliError::Config(format!("cannot read {}: {e}", full.display())))
        })
        .transpose()
    };

    let sp = SpConfig {
        entity_id: file.sp.entity_id,
        assertion_consumer_service: file.sp.assertion_consumer_service,
        single_logout_service: file.sp.single_logout_service,
        name_id_format: file.sp.name_id_format,
        certificate: read(file.sp.certificate_file)?,
        private_key: read(file.sp.private_key_file)?,
    };
    let idp = IdpConfig {
        entity_id: file.idp.entity_id,
        single_sign_on_service: file.idp.single_sign_on_service,
        single_logout_service: file.idp.single_logout_service,
        certificate: read(file.idp.certificate_file)?,
        certificate_fingerprint: file.idp.certificate_fingerprint,
        fingerprint_algorithm: file.idp.fingerprint_algorithm,
    };

    Ok(SamlSettings::new(sp, idp).with_security(file.security))
}
