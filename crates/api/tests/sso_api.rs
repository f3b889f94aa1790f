//! HTTP-level tests for the SSO handshake and token lifecycle.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, get, identity_record, post_json, seed_user, SSO_SECRET};
use grantdesk_api::auth::sso::{sign_assertion, Assertion};
use grantdesk_core::identity::StaticDirectory;
use serde_json::json;
use sqlx::PgPool;

fn assertion(username: &str, secret: &str) -> String {
    sign_assertion(
        &Assertion {
            username: username.to_string(),
            issued_at: Utc::now().timestamp(),
        },
        secret,
    )
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn first_login_provisions_and_enriches(pool: PgPool) {
    let directory = Arc::new(StaticDirectory::new());
    directory.insert(identity_record("12345678", "PDI", true));
    let app = common::build_test_app_with_directory(pool, directory);

    let response = post_json(
        app,
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("12345678", SSO_SECRET) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    assert!(json["data"]["refresh_token"].is_string());
    assert_eq!(json["data"]["user"]["username"], "12345678");
    assert_eq!(json["data"]["user"]["email"], "12345678@uni.test");
    assert_eq!(json["data"]["user"]["collectives"], json!(["PDI", "EST"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_signature_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("12345678", "not-the-secret") }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_person_is_not_provisioned(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("87654321", SSO_SECRET) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        grantdesk_db::repositories::UserRepo::find_by_username(&pool, "87654321")
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn registry_outage_keeps_cached_identity(pool: PgPool) {
    // Known locally, absent from the registry.
    seed_user(&pool, "12345678", "PDI", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("12345678", SSO_SECRET) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["collectives"], json!(["PDI"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    seed_user(&pool, "12345678", "PDI", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("12345678", SSO_SECRET) }),
    )
    .await;
    let refresh_token = body_json(response).await["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        app.clone(),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The old token was revoked by the rotation.
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_refresh_with_one_token_rotates_once(pool: PgPool) {
    seed_user(&pool, "12345678", "PDI", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/sso/callback",
        json!({ "assertion": assertion("12345678", SSO_SECRET) }),
    )
    .await;
    let refresh_token = body_json(response).await["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let body = json!({ "refresh_token": refresh_token });
    let (first, second) = tokio::join!(
        post_json(app.clone(), "/api/v1/auth/refresh", body.clone()),
        post_json(app, "/api/v1/auth/refresh", body),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_url_points_at_the_idp(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/auth/sso/login").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["redirect_url"]
        .as_str()
        .unwrap()
        .starts_with("http://idp.test/sso?"));
}
