//! End-to-End Integration Tests
//!
//! These tests drive the public API of `sp-protocol-saml` through complete
//! login round trips, with a simulated IdP signing fresh responses.

mod common;
mod bindings;
mod login_flow;
mod signatures;
