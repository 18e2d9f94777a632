//! OAuth 2.0 helpers used by redirect-based Volt executors.
//!
//! Currently PKCE (RFC 7636), restricted to the S256 challenge method.

mod pkce;

pub use pkce::{generate_pkce, validate_verifier, PkceCodes, PkceError};
