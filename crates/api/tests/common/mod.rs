#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Days, NaiveDate, Utc};
use grantdesk_api::auth::jwt::{generate_access_token, JwtConfig};
use grantdesk_api::auth::sso::SsoConfig;
use grantdesk_api::config::ServerConfig;
use grantdesk_api::router::build_app_router;
use grantdesk_api::state::AppState;
use grantdesk_core::deadlines::CallDeadlines;
use grantdesk_core::identity::{
    Enrichment, EnrollmentAffiliation, IdentityRecord, PersonRecord, ProfileAffiliation,
    StaticDirectory,
};
use grantdesk_core::types::DbId;
use grantdesk_db::models::call::{CreateCall, UpdateCall};
use grantdesk_db::models::group::CreatePermissionGroup;
use grantdesk_db::models::program::{CreateProgram, Program};
use grantdesk_db::models::user::{UpdateUser, User};
use grantdesk_db::repositories::{CallRepo, GroupRepo, ProgramRepo, UserRepo};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const SSO_SECRET: &str = "test-sso-secret";

/// A `ServerConfig` with fixed secrets and a fresh media directory.
pub fn test_config() -> ServerConfig {
    let media_root: PathBuf =
        std::env::temp_dir().join(format!("grantdesk-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&media_root).unwrap();

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        identity_database_url: None,
        media_root,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        sso: SsoConfig {
            shared_secret: SSO_SECRET.to_string(),
            idp_url: "http://idp.test/sso".to_string(),
            entity_id: "http://grantdesk.test".to_string(),
            max_skew_secs: 120,
        },
    }
}

/// Build the full application router over `pool` with an empty directory.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_directory(pool, Arc::new(StaticDirectory::new()))
}

/// Build the full application router over `pool` and `directory`, with the
/// same middleware stack as production.
pub fn build_test_app_with_directory(pool: PgPool, directory: Arc<StaticDirectory>) -> Router {
    build_app(pool, directory, test_config())
}

/// Like [`build_test_app`], also returning the media root uploads land in.
pub fn build_test_app_with_media(pool: PgPool) -> (Router, PathBuf) {
    let config = test_config();
    let media_root = config.media_root.clone();
    let app = build_app(pool, Arc::new(StaticDirectory::new()), config);
    (app, media_root)
}

fn build_app(pool: PgPool, directory: Arc<StaticDirectory>, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        directory,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// POST a single multipart field named `file`.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    filename: &str,
    bytes: &[u8],
    token: &str,
) -> Response<Body> {
    let boundary = "grantdesk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).unwrap()
}

/// A registry record. `student` adds an enrollment, which makes the person EST.
pub fn identity_record(username: &str, collective: &str, student: bool) -> IdentityRecord {
    IdentityRecord {
        person: PersonRecord {
            username: username.to_string(),
            first_name: "Ana".to_string(),
            last_name_1: "Pérez".to_string(),
            last_name_2: None,
            email: Some(format!("{username}@uni.test")),
            document_id: None,
        },
        profiles: vec![ProfileAffiliation {
            collective: collective.to_string(),
            center_code: Some("103".to_string()),
            department_code: None,
        }],
        enrollments: if student {
            vec![EnrollmentAffiliation {
                center_code: Some("103".to_string()),
                study_code: Some("G123".to_string()),
            }]
        } else {
            Vec::new()
        },
    }
}

/// Insert an enriched, active user.
pub async fn seed_user(pool: &PgPool, username: &str, collective: &str, student: bool) -> User {
    let user = UserRepo::create(pool, username).await.unwrap();
    let enrichment = Enrichment::from_record(&identity_record(username, collective, student));
    UserRepo::apply_enrichment(pool, user.id, &enrichment)
        .await
        .unwrap()
}

pub async fn seed_admin(pool: &PgPool, username: &str) -> User {
    let user = seed_user(pool, username, "PAS", false).await;
    UserRepo::update(
        pool,
        user.id,
        &UpdateUser {
            is_active: None,
            is_admin: Some(true),
        },
    )
    .await
    .unwrap()
    .unwrap()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

/// Deadlines laid out so that `today` sits `offset` days after
/// `submissions_open`. With `offset` between 0 and 10 submissions are open.
pub fn deadlines_around_today(offset: i64) -> CallDeadlines {
    let open = shift(today(), -offset);
    CallDeadlines {
        submissions_open: open,
        submissions_close: shift(open, 10),
        approvals_deadline: shift(open, 20),
        evaluations_deadline: shift(open, 30),
        acceptance_deadline: shift(open, 40),
        report_open: shift(open, 50),
        report_deadline: shift(open, 60),
        report_review_deadline: shift(open, 70),
    }
}

pub const YEAR: i32 = 2026;

/// Program settings with no sign-offs and a single coordinator.
pub fn program_input(max_participants: i32) -> CreateProgram {
    CreateProgram {
        short_name: "PIEC".to_string(),
        name: "Teaching innovation".to_string(),
        requires_center_approval: false,
        requires_study_approval: false,
        max_participants,
        max_aid: Some(1500),
        has_co_coordinator: false,
        participant_cap_exempt: false,
    }
}

/// Create a call with `deadlines` and one program in it.
pub async fn seed_program(
    pool: &PgPool,
    deadlines: CallDeadlines,
    max_participants: i32,
) -> Program {
    seed_program_with(pool, deadlines, program_input(max_participants)).await
}

pub async fn seed_program_with(
    pool: &PgPool,
    deadlines: CallDeadlines,
    program: CreateProgram,
) -> Program {
    CallRepo::create(pool, &CreateCall { year: YEAR, deadlines })
        .await
        .unwrap();
    ProgramRepo::create(pool, YEAR, &program).await.unwrap()
}

/// Move every deadline of the seeded call, as if time had passed.
pub async fn move_deadlines(pool: &PgPool, deadlines: CallDeadlines) {
    CallRepo::update(
        pool,
        YEAR,
        &UpdateCall {
            submissions_open: Some(deadlines.submissions_open),
            submissions_close: Some(deadlines.submissions_close),
            approvals_deadline: Some(deadlines.approvals_deadline),
            evaluations_deadline: Some(deadlines.evaluations_deadline),
            acceptance_deadline: Some(deadlines.acceptance_deadline),
            report_open: Some(deadlines.report_open),
            report_deadline: Some(deadlines.report_deadline),
            report_review_deadline: Some(deadlines.report_review_deadline),
            is_open: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
}

/// Put `user_id` in a fresh group holding `permissions`.
pub async fn grant(pool: &PgPool, user_id: DbId, permissions: &[&str]) {
    let group = GroupRepo::create(
        pool,
        &CreatePermissionGroup {
            name: format!("group-{}", uuid::Uuid::new_v4()),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        },
    )
    .await
    .unwrap();
    GroupRepo::add_member(pool, group.id, user_id).await.unwrap();
}

/// Create a project over HTTP and return its id.
pub async fn create_project(app: Router, body: serde_json::Value, token: &str) -> DbId {
    let response = post_json_auth(app, "/api/v1/projects", body, token).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

pub async fn transition(app: Router, id: DbId, name: &str, token: &str) -> Response<Body> {
    post_json_auth(
        app,
        &format!("/api/v1/projects/{id}/transitions"),
        serde_json::json!({ "transition": name }),
        token,
    )
    .await
}

pub fn project_body(program_id: DbId) -> serde_json::Value {
    serde_json::json!({
        "program_id": program_id,
        "title": "Flipped classroom in Algebra",
        "aid_requested": 800,
    })
}
