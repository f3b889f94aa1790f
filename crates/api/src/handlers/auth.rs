//! Handlers for the `/auth` resource (SSO login, refresh, logout).
//!
//! Authentication is delegated to the university identity gateway: it posts
//! a signed assertion naming the user, and on success the local user row is
//! created if needed and refreshed from the identity registry.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use grantdesk_core::error::CoreError;
use grantdesk_core::identity::{Enrichment, IdentityError};
use grantdesk_core::types::DbId;
use grantdesk_db::models::session::CreateSession;
use grantdesk_db::models::user::User;
use grantdesk_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::sso::verify_assertion;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client_ip::ClientIp;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sso/callback`.
#[derive(Debug, Deserialize)]
pub struct SsoCallbackRequest {
    pub assertion: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by the callback and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct SsoLogin {
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct SsoMetadata {
    pub entity_id: String,
    pub assertion_consumer_url: String,
    pub idp_url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/auth/sso/login
///
/// Where the client should send the browser to authenticate.
pub async fn sso_login(State(state): State<AppState>) -> Json<DataResponse<SsoLogin>> {
    Json(DataResponse {
        data: SsoLogin {
            redirect_url: state.config.sso.login_redirect_url(),
        },
    })
}

/// GET /api/v1/auth/sso/metadata
pub async fn sso_metadata(State(state): State<AppState>) -> Json<DataResponse<SsoMetadata>> {
    let sso = &state.config.sso;
    Json(DataResponse {
        data: SsoMetadata {
            entity_id: sso.entity_id.clone(),
            assertion_consumer_url: sso.assertion_consumer_url(),
            idp_url: sso.idp_url.clone(),
        },
    })
}

/// POST /api/v1/auth/sso/callback
///
/// Verify the gateway assertion, provision and enrich the user, and issue
/// access + refresh tokens.
pub async fn sso_callback(
    State(state): State<AppState>,
    ip: ClientIp,
    headers: HeaderMap,
    Json(input): Json<SsoCallbackRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    // 1. Verify signature and freshness.
    let assertion = verify_assertion(&input.assertion, &state.config.sso, Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected SSO assertion");
            AppError::Core(CoreError::Unauthorized(e.to_string()))
        })?;

    // 2. Find or provision the local user, refreshing the cached identity.
    let user = match UserRepo::find_by_username(&state.pool, &assertion.username).await? {
        Some(user) => refresh_identity(&state, user).await?,
        None => provision_user(&state, &assertion.username).await?,
    };

    // 3. Check the account is active.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 4. Record login, issue tokens.
    UserRepo::record_login(&state.pool, user.id).await?;
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let response = create_auth_response(&state, user, user_agent, ip.0).await?;

    tracing::info!(user_id = response.user.id, "User logged in via SSO");
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    // Token rotation: the presented token is single-use.
    let session = SessionRepo::consume_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let response = create_auth_response(&state, user, session.user_agent, ip.0).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a user for a first-time login and enrich it, atomically.
///
/// A username unknown to the registry rolls the insert back.
async fn provision_user(state: &AppState, username: &str) -> AppResult<User> {
    let mut tx = state.pool.begin().await?;
    let user = UserRepo::create(&mut *tx, username).await?;

    let record = match state.directory.lookup(username).await {
        Ok(record) => record,
        Err(IdentityError::NotFound { .. }) => {
            tracing::warn!(username, "SSO login for a user unknown to the registry");
            return Err(AppError::Core(CoreError::Unauthorized(
                "User is not registered at the university".into(),
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let user = UserRepo::apply_enrichment(&mut *tx, user.id, &Enrichment::from_record(&record))
        .await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "Provisioned user on first login");
    Ok(user)
}

/// Overwrite the cached identity of an existing user.
///
/// Registry failures keep the cached copy so an outage does not block logins.
async fn refresh_identity(state: &AppState, user: User) -> AppResult<User> {
    match state.directory.lookup(&user.username).await {
        Ok(record) => Ok(UserRepo::apply_enrichment(
            &state.pool,
            user.id,
            &Enrichment::from_record(&record),
        )
        .await?),
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "Identity refresh failed, keeping cached data");
            Ok(user)
        }
    }
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user: User,
    user_agent: Option<String>,
    ip_address: Option<String>,
) -> AppResult<AuthResponse> {
    let access_token = issue_access_token(state, user.id)?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at,
        user_agent,
        ip_address,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user,
    })
}

fn issue_access_token(state: &AppState, user_id: DbId) -> AppResult<String> {
    generate_access_token(user_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}
