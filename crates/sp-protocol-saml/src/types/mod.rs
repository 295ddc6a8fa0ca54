//! SAML 2.0 types and data structures.
//!
//! Requests the SP sends, the response and assertion data it reads back, and
//! the URI vocabularies they share.

mod assertion;
mod authn_request;
mod constants;
mod instant;
mod logout;
mod name_id;
mod response;
mod status;

pub use assertion::*;
pub use authn_request::*;
pub use constants::*;
pub use instant::*;
pub use logout::*;
pub use name_id::*;
pub use response::*;
pub use status::*;
