//! End-to-end tests for the SAML service provider live under `tests/`.
