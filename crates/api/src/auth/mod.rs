//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation, validation, and refresh-token helpers.
//! - [`sso`] -- verification of signed assertions from the university IdP gateway.

pub mod jwt;
pub mod sso;
