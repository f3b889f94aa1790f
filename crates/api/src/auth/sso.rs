//! Single sign-on through the university's IdP gateway.
//!
//! The gateway authenticates the user and posts back an assertion of the
//! form `base64url(json).base64url(hmac_sha256(json_part))`, where the JSON
//! payload is [`Assertion`]. The shared secret is configured on both sides.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default tolerated clock difference between gateway and server.
const DEFAULT_MAX_SKEW_SECS: i64 = 120;

/// Configuration for the SSO handshake.
#[derive(Debug, Clone)]
pub struct SsoConfig {
    /// Secret shared with the IdP gateway.
    pub shared_secret: String,
    /// Where the browser is sent to authenticate.
    pub idp_url: String,
    /// Our service-provider entity id (also the public base URL).
    pub entity_id: String,
    /// Maximum accepted age (and future skew) of an assertion, in seconds.
    pub max_skew_secs: i64,
}

impl SsoConfig {
    /// Load SSO configuration from environment variables.
    ///
    /// | Env Var              | Required | Default                  |
    /// |----------------------|----------|--------------------------|
    /// | `SSO_SHARED_SECRET`  | **yes**  | --                       |
    /// | `SSO_IDP_URL`        | no       | `http://localhost:8081/sso` |
    /// | `SSO_ENTITY_ID`      | no       | `http://localhost:3000`  |
    /// | `SSO_MAX_SKEW_SECS`  | no       | `120`                    |
    ///
    /// # Panics
    ///
    /// Panics if `SSO_SHARED_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let shared_secret = std::env::var("SSO_SHARED_SECRET")
            .expect("SSO_SHARED_SECRET must be set in the environment");
        assert!(!shared_secret.is_empty(), "SSO_SHARED_SECRET must not be empty");

        let idp_url = std::env::var("SSO_IDP_URL")
            .unwrap_or_else(|_| "http://localhost:8081/sso".into());
        let entity_id =
            std::env::var("SSO_ENTITY_ID").unwrap_or_else(|_| "http://localhost:3000".into());
        let max_skew_secs: i64 = std::env::var("SSO_MAX_SKEW_SECS")
            .unwrap_or_else(|_| DEFAULT_MAX_SKEW_SECS.to_string())
            .parse()
            .expect("SSO_MAX_SKEW_SECS must be a valid i64");

        Self {
            shared_secret,
            idp_url,
            entity_id,
            max_skew_secs,
        }
    }

    /// URL the gateway posts assertions back to.
    pub fn assertion_consumer_url(&self) -> String {
        format!(
            "{}/api/v1/auth/sso/callback",
            self.entity_id.trim_end_matches('/')
        )
    }

    /// URL the browser is redirected to for authentication.
    pub fn login_redirect_url(&self) -> String {
        let separator = if self.idp_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}entity_id={}&acs={}",
            self.idp_url,
            self.entity_id,
            self.assertion_consumer_url()
        )
    }
}

/// The signed claim issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// The authenticated NIP.
    pub username: String,
    /// Issue time (UTC Unix timestamp).
    pub issued_at: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssertionError {
    #[error("Malformed assertion")]
    Malformed,
    #[error("Assertion signature mismatch")]
    BadSignature,
    #[error("Assertion expired or issued in the future")]
    Stale,
}

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Sign an assertion the way the gateway does.
pub fn sign_assertion(assertion: &Assertion, secret: &str) -> String {
    let payload = serde_json::to_vec(assertion).unwrap_or_default();
    let payload_part = URL_SAFE_NO_PAD.encode(payload);
    let mut mac = mac(secret);
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{payload_part}.{sig_part}")
}

/// Verify signature and freshness of an assertion received at time `now`.
pub fn verify_assertion(
    token: &str,
    config: &SsoConfig,
    now: i64,
) -> Result<Assertion, AssertionError> {
    let (payload_part, sig_part) = token.split_once('.').ok_or(AssertionError::Malformed)?;

    let signature = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|_| AssertionError::Malformed)?;
    let mut mac = mac(&config.shared_secret);
    mac.update(payload_part.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AssertionError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|_| AssertionError::Malformed)?;
    let assertion: Assertion =
        serde_json::from_slice(&payload).map_err(|_| AssertionError::Malformed)?;

    if assertion.username.trim().is_empty() {
        return Err(AssertionError::Malformed);
    }
    if (now - assertion.issued_at).abs() > config.max_skew_secs {
        return Err(AssertionError::Stale);
    }
    Ok(assertion)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> SsoConfig {
        SsoConfig {
            shared_secret: "gateway-secret".to_string(),
            idp_url: "https://idp.example.edu/sso".to_string(),
            entity_id: "https://grants.example.edu/".to_string(),
            max_skew_secs: 60,
        }
    }

    fn assertion(issued_at: i64) -> Assertion {
        Assertion {
            username: "12345678".to_string(),
            issued_at,
        }
    }

    #[test]
    fn signed_assertion_verifies() {
        let token = sign_assertion(&assertion(1_000), "gateway-secret");
        assert_eq!(
            verify_assertion(&token, &config(), 1_030).unwrap(),
            assertion(1_000)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_assertion(&assertion(1_000), "someone-else");
        assert_matches!(
            verify_assertion(&token, &config(), 1_000),
            Err(AssertionError::BadSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = sign_assertion(&assertion(1_000), "gateway-secret");
        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"username":"99999999","issued_at":1000}"#);
        assert_matches!(
            verify_assertion(&format!("{forged_payload}.{sig}"), &config(), 1_000),
            Err(AssertionError::BadSignature)
        );
    }

    #[test]
    fn skew_bound_is_inclusive() {
        let token = sign_assertion(&assertion(1_000), "gateway-secret");
        assert!(verify_assertion(&token, &config(), 1_060).is_ok());
        assert_matches!(
            verify_assertion(&token, &config(), 1_061),
            Err(AssertionError::Stale)
        );
        assert_matches!(
            verify_assertion(&token, &config(), 939),
            Err(AssertionError::Stale)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_matches!(
            verify_assertion("not-a-token", &config(), 0),
            Err(AssertionError::Malformed)
        );
    }

    #[test]
    fn urls_are_derived_from_entity_id() {
        let cfg = config();
        assert_eq!(
            cfg.assertion_consumer_url(),
            "https://grants.example.edu/api/v1/auth/sso/callback"
        );
        assert!(cfg
            .login_redirect_url()
            .starts_with("https://idp.example.edu/sso?entity_id="));
    }
}
