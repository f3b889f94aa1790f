//! HTTP-level tests for the steps around the status workflow.
//!
//! - Center / study sign-off and the center affiliation rule
//! - Financial closure, once
//! - Valuations: evaluation window and criterion kind
//! - Team changes: decline, removal, co-coordinator

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_project, deadlines_around_today, delete_auth, get_auth, grant,
    move_deadlines, post_json_auth, program_input, project_body, put_json_auth, seed_admin,
    seed_program, seed_program_with, seed_user, token_for, transition, YEAR,
};
use grantdesk_core::permissions::{CLOSE_FINANCIALLY, EVALUATE_PROJECTS, SIGN_OFF_CENTER};
use grantdesk_core::rubric::CriterionKind;
use grantdesk_core::types::DbId;
use grantdesk_db::models::evaluation::{CreateCriterion, CreateCriterionOption};
use grantdesk_db::models::reference::CreateUnit;
use grantdesk_db::repositories::{CenterRepo, CriterionRepo};
use serde_json::json;
use sqlx::PgPool;

async fn seed_center(pool: &PgPool, code: &str) -> DbId {
    CenterRepo::create(
        pool,
        &CreateUnit {
            code: code.to_string(),
            name: format!("Center {code}"),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Sign-off
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn center_sign_off_needs_staff_of_that_center(pool: PgPool) {
    let mut program = program_input(5);
    program.requires_center_approval = true;
    let program = seed_program_with(&pool, deadlines_around_today(5), program).await;
    let own_center = seed_center(&pool, "103").await;
    let other_center = seed_center(&pool, "200").await;

    // Fixture users are affiliated with center 103.
    let coordinator = seed_user(&pool, "11111111", "PDI", false).await;
    let signer = seed_user(&pool, "22222222", "PAS", false).await;
    grant(&pool, signer.id, &[SIGN_OFF_CENTER]).await;
    let app = common::build_test_app(pool);
    let token = token_for(coordinator.id);
    let signer_token = token_for(signer.id);

    let mut ids = Vec::new();
    for center_id in [own_center, other_center] {
        let mut body = project_body(program.id);
        body["center_id"] = json!(center_id);
        let id = create_project(app.clone(), body, &token).await;
        let response = transition(app.clone(), id, "submit", &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        ids.push(id);
    }
    let (own, other) = (ids[0], ids[1]);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{other}/sign-off/center"),
        json!({ "approved": true }),
        &signer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{own}/sign-off/center"),
        json!({ "approved": true }),
        &signer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["center_approval"], true);

    // This program has no study sign-off at all.
    let response = post_json_auth(
        app,
        &format!("/api/v1/projects/{own}/sign-off/study"),
        json!({}),
        &signer_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Financial closure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn financial_closure_happens_once(pool: PgPool) {
    let program = seed_program(&pool, deadlines_around_today(5), 5).await;
    let coordinator = seed_user(&pool, "11111111", "PDI", false).await;
    let admin = seed_admin(&pool, "00000001").await;
    let closer = seed_user(&pool, "22222222", "PAS", false).await;
    grant(&pool, closer.id, &[CLOSE_FINANCIALLY]).await;
    let app = common::build_test_app(pool);
    let token = token_for(coordinator.id);
    let closer_token = token_for(closer.id);

    let id = create_project(app.clone(), project_body(program.id), &token).await;
    let closure = format!("/api/v1/projects/{id}/financial-closure");
    assert_eq!(
        transition(app.clone(), id, "submit", &token).await.status(),
        StatusCode::OK
    );

    // Nothing to close before the coordinator accepts the grant.
    let response = post_json_auth(app.clone(), &closure, json!({}), &closer_token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let admin_token = token_for(admin.id);
    assert_eq!(
        transition(app.clone(), id, "committee_approve", &admin_token)
            .await
            .status(),
        StatusCode::OK
    );
    assert_eq!(
        transition(app.clone(), id, "coordinator_accept", &token)
            .await
            .status(),
        StatusCode::OK
    );

    let response = post_json_auth(app.clone(), &closure, json!({}), &closer_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_financially_closed"], true);

    let response = post_json_auth(app.clone(), &closure, json!({}), &closer_token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The coordinator lacks the permission altogether.
    let response = post_json_auth(app, &closure, json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Valuations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn valuations_follow_the_window_and_the_criterion_kind(pool: PgPool) {
    let program = seed_program(&pool, deadlines_around_today(5), 5).await;
    let scored = CriterionRepo::create(
        &pool,
        YEAR,
        &CreateCriterion {
            position: 1,
            description: "Feasibility".to_string(),
            kind: CriterionKind::Options,
        },
    )
    .await
    .unwrap();
    let high = CriterionRepo::create_option(
        &pool,
        scored.id,
        &CreateCriterionOption {
            position: 1,
            description: "High".to_string(),
            score: 10,
        },
    )
    .await
    .unwrap();
    let low = CriterionRepo::create_option(
        &pool,
        scored.id,
        &CreateCriterionOption {
            position: 2,
            description: "Low".to_string(),
            score: 2,
        },
    )
    .await
    .unwrap();
    let remarks = CriterionRepo::create(
        &pool,
        YEAR,
        &CreateCriterion {
            position: 2,
            description: "Remarks".to_string(),
            kind: CriterionKind::Text,
        },
    )
    .await
    .unwrap();

    let coordinator = seed_user(&pool, "11111111", "PDI", false).await;
    let evaluator = seed_user(&pool, "22222222", "PDI", false).await;
    grant(&pool, evaluator.id, &[EVALUATE_PROJECTS]).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(coordinator.id);
    let evaluator_token = token_for(evaluator.id);

    let id = create_project(app.clone(), project_body(program.id), &token).await;
    assert_eq!(
        transition(app.clone(), id, "submit", &token).await.status(),
        StatusCode::OK
    );
    let valuations = format!("/api/v1/projects/{id}/valuations");

    // Submissions are still open.
    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": scored.id, "option_id": high.id }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Submissions closed five days ago; evaluations run for fifteen more.
    move_deadlines(&pool, deadlines_around_today(15)).await;

    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": scored.id, "text": "Looks feasible" }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": remarks.id, "option_id": high.id }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": scored.id, "option_id": high.id }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A second valuation of the same criterion replaces the first.
    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": scored.id, "option_id": low.id }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        app.clone(),
        &valuations,
        json!({ "criterion_id": remarks.id, "text": "<p>Clear plan</p>" }),
        &evaluator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app, &valuations, &evaluator_token).await;
    let json = body_json(response).await;
    let stored = json["data"].as_array().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored
        .iter()
        .any(|v| v["criterion_id"] == scored.id && v["option_id"] == low.id));
}

// ---------------------------------------------------------------------------
// Team changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn decline_remove_and_co_coordinator(pool: PgPool) {
    let mut program = program_input(5);
    program.has_co_coordinator = true;
    let program = seed_program_with(&pool, deadlines_around_today(5), program).await;
    let coordinator = seed_user(&pool, "11111111", "PDI", false).await;
    let decliner = seed_user(&pool, "22222222", "PDI", false).await;
    let partner = seed_user(&pool, "33333333", "PDI", false).await;
    let pending = seed_user(&pool, "44444444", "PDI", false).await;
    let app = common::build_test_app(pool);
    let token = token_for(coordinator.id);

    let id = create_project(app.clone(), project_body(program.id), &token).await;
    let participants = format!("/api/v1/projects/{id}/participants");
    for nip in ["22222222", "33333333", "44444444"] {
        let response =
            post_json_auth(app.clone(), &participants, json!({ "nip": nip }), &token).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{id}/invitation/decline"),
        json!({}),
        &token_for(decliner.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role_id"], 5);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{id}/invitation/accept"),
        json!({}),
        &token_for(partner.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let co_coordinator = format!("/api/v1/projects/{id}/co-coordinator");

    // Only accepted participants can be promoted.
    let response = put_json_auth(
        app.clone(),
        &co_coordinator,
        json!({ "user_id": decliner.id }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.clone(),
        &co_coordinator,
        json!({ "user_id": partner.id }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role_id"], 2);

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/projects/{id}/participants/{}", pending.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/projects/{id}/participants/{}", partner.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(app, &participants, &token).await;
    let team = body_json(response).await;
    let roles: Vec<(i64, i64)> = team["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["user_id"].as_i64().unwrap(), p["role_id"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        roles,
        vec![(coordinator.id, 1), (partner.id, 2), (decliner.id, 5)]
    );
}
