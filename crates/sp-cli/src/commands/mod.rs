//! Command implementations.

pub mod decode;
pub mod fingerprint;
pub mod login;
pub mod metadata;
pub mod verify;

pub use decode::run_decode;
pub use fingerprint::run_fingerprint;
pub use login::run_login_url;
pub use metadata::run_metadata;
pub use verify::run_verify_response;

use crate::cli::{Cli, Command};
use crate::config::load_settings;

/// Runs the selected command.
///
/// # Errors
///
/// Returns the command's error.
pub fn run(cli: Cli) -> crate::CliResult<()> {
    match cli.command {
        Command::Metadata => run_metadata(&load_settings(&cli.settings)?),
        Command::Fingerprint {
            certificate,
            algorithm,
        } => run_fingerprint(&certificate, &algorithm, cli.output),
        Command::LoginUrl {
            relay_state,
            force_authn,
            passive,
            name_id_policy,
        } => run_login_url(
            load_settings(&cli.settings)?,
            relay_state.as_deref(),
            force_authn,
            passive,
            name_id_policy,
            cli.output,
        ),
        Command::Decode { value, binding } => run_decode(&value, binding, cli.output),
        Command::VerifyResponse {
            file,
            request_id,
            at,
        } => run_verify_response(
            load_settings(&cli.settings)?,
            &file,
            request_id.as_deref(),
            at.as_deref(),
            cli.output,
        ),
    }
}
