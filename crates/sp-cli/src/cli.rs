//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// SAML service provider tooling.
#[derive(Debug, Parser)]
#[command(name = "sp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file.
    #[arg(short, long, env = "SP_SETTINGS", default_value = "sp.toml")]
    pub settings: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print SP metadata.
    Metadata,

    /// Compute the fingerprint of a PEM certificate.
    Fingerprint {
        /// Certificate file.
        certificate: PathBuf,

        /// Hash algorithm (sha1, sha256, sha384, sha512).
        #[arg(short, long, default_value = "sha256")]
        algorithm: String,
    },

    /// Produce a login URL or POST form.
    LoginUrl {
        /// Relay state (post-login destination).
        #[arg(long)]
        relay_state: Option<String>,

        /// Ask the IdP to re-authenticate the user.
        #[arg(long)]
        force_authn: bool,

        /// Ask the IdP not to interact with the user.
        #[arg(long)]
        passive: bool,

        /// Include a NameIDPolicy with the configured format.
        #[arg(long)]
        name_id_policy: bool,
    },

    /// Decode a binding payload.
    Decode {
        /// Encoded value, or a full redirect URL.
        value: String,

        /// Binding the value was encoded for.
        #[arg(short, long, value_enum, default_value = "post")]
        binding: BindingArg,
    },

    /// Run a response through parsing and validation.
    VerifyResponse {
        /// File holding the `SAMLResponse` form value or the raw XML.
        file: PathBuf,

        /// ID of the request the response must answer.
        #[arg(long)]
        request_id: Option<String>,

        /// Validate as of this instant (RFC 3339) instead of now.
        #[arg(long)]
        at: Option<String>,
    },
}

/// Binding selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BindingArg {
    /// HTTP-POST (base64).
    Post,
    /// HTTP-Redirect (deflate, base64, percent-encoding).
    Redirect,
}
