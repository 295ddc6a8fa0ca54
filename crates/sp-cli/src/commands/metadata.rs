//! SP metadata command.

use sp_protocol_saml::{SamlSettings, SpMetadata};

/// Prints SP metadata.
pub fn run_metadata(settings: &SamlSettings) -> crate::CliResult<()> {
    println!("{}", SpMetadata::generate(settings)?);
    Ok(())
}
