//! Request extractors for authentication, authorization and client metadata.
//!
//! - [`auth::AuthUser`] -- Extracts the user id from a JWT Bearer token.
//! - [`rbac::RequireAuth`] -- Loads the active caller and their permissions.
//! - [`rbac::RequireAdmin`] -- Requires the administrator flag.
//! - [`client_ip::ClientIp`] -- Best-effort client address for the audit log.

pub mod auth;
pub mod client_ip;
pub mod rbac;
