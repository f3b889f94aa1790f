use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;
use crate::auth::sso::SsoConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// secrets in [`JwtConfig`] and [`SsoConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Connection string of the read-only identity registry. When unset the
    /// server uses an empty in-memory directory.
    pub identity_database_url: Option<String>,
    /// Root directory for uploaded attachments and report snapshots.
    pub media_root: PathBuf,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Single sign-on assertion settings.
    pub sso: SsoConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `IDENTITY_DATABASE_URL`  | unset                      |
    /// | `MEDIA_ROOT`             | `./media`                  |
    ///
    /// `DATABASE_URL` is read separately in `main.rs`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let identity_database_url = std::env::var("IDENTITY_DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let media_root =
            PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".into()));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            identity_database_url,
            media_root,
            jwt: JwtConfig::from_env(),
            sso: SsoConfig::from_env(),
        }
    }
}
