//! # sp-cli
//!
//! Operator tooling for the SAML service provider.
//!
//! This crate provides command-line utilities for:
//! - Printing SP metadata for registration with an IdP
//! - Computing certificate fingerprints
//! - Producing login URLs or POST forms
//! - Decoding binding payloads
//! - Running a captured response through the full validation pipeline

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::load_settings;
pub use error::{CliError, CliResult};
