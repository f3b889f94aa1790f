//! Permission-based access control extractors.
//!
//! [`RequireAuth`] resolves the bearer token into a [`Caller`]: the active
//! user row plus the union of their group permissions. Handlers then check
//! named permissions with [`Caller::require`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::PermissionSet;
use grantdesk_core::types::DbId;
use grantdesk_db::models::user::User;
use grantdesk_db::repositories::{GroupRepo, UserRepo};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated, active user making the request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    pub permissions: PermissionSet,
}

impl Caller {
    pub fn id(&self) -> DbId {
        self.user.id
    }

    /// Fail with 403 unless the caller holds `permission`.
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.permissions.has(permission) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "{permission} permission required"
            ))))
        }
    }

    async fn load(state: &AppState, user_id: DbId) -> Result<Self, AppError> {
        let user = UserRepo::find_by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

        if !user.is_active {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is deactivated".into(),
            )));
        }

        let permissions = if user.is_admin {
            PermissionSet::admin()
        } else {
            PermissionSet::from_codes(GroupRepo::permissions_for_user(&state.pool, user.id).await?)
        };

        Ok(Caller { user, permissions })
    }
}

/// Requires any active, authenticated user.
///
/// ```ignore
/// async fn any_authed(RequireAuth(caller): RequireAuth) -> AppResult<Json<()>> {
///     caller.require(permissions::EXPORT_DATA)?;
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAuth(pub Caller);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(Caller::load(state, auth.user_id).await?))
    }
}

/// Requires an administrator. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(caller) = RequireAuth::from_request_parts(parts, state).await?;
        if !caller.permissions.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Administrator required".into(),
            )));
        }
        Ok(RequireAdmin(caller))
    }
}
