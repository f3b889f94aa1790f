//! Export queries against an empty and a populated call year.

use chrono::NaiveDate;
use grantdesk_core::deadlines::CallDeadlines;
use grantdesk_core::export::{summary_table, valuation_table};
use grantdesk_core::rubric::CriterionKind;
use grantdesk_db::models::call::CreateCall;
use grantdesk_db::models::evaluation::{CreateCriterion, CreateCriterionOption, UpsertValuation};
use grantdesk_db::models::program::CreateProgram;
use grantdesk_db::models::project::CreateProject;
use grantdesk_db::repositories::project_repo::Actor;
use grantdesk_db::repositories::{
    CallRepo, CriterionRepo, ExportRepo, ProgramRepo, ProjectRepo, UserRepo, ValuationRepo,
};
use sqlx::PgPool;

async fn seed_call(pool: &PgPool, year: i32) {
    let d = |m, day| NaiveDate::from_ymd_opt(year, m, day).unwrap();
    CallRepo::create(
        pool,
        &CreateCall {
            year,
            deadlines: CallDeadlines {
                submissions_open: d(1, 10),
                submissions_close: d(2, 10),
                approvals_deadline: d(2, 20),
                evaluations_deadline: d(3, 10),
                acceptance_deadline: d(3, 31),
                report_open: d(9, 1),
                report_deadline: d(10, 31),
                report_review_deadline: d(11, 30),
            },
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_year_exports_only_headers(pool: PgPool) {
    seed_call(&pool, 2025).await;

    let summaries = ExportRepo::project_summaries(&pool, 2025).await.unwrap();
    assert!(summaries.is_empty());
    assert_eq!(summary_table(&summaries).rows.len(), 1);

    let matrix = ExportRepo::valuation_matrix(&pool, 2025).await.unwrap();
    let table = valuation_table(&matrix.projects, &matrix.criteria, &matrix.cells);
    assert_eq!(table.rows.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn populated_year_exports_one_row_per_project(pool: PgPool) {
    seed_call(&pool, 2026).await;
    let program = ProgramRepo::create(
        &pool,
        2026,
        &CreateProgram {
            short_name: "PIEC".to_string(),
            name: "Teaching innovation".to_string(),
            requires_center_approval: false,
            requires_study_approval: false,
            max_participants: 5,
            max_aid: None,
            has_co_coordinator: false,
            participant_cap_exempt: false,
        },
    )
    .await
    .unwrap();
    let user = UserRepo::create(&pool, "12345678").await.unwrap();
    let actor = Actor {
        user_id: user.id,
        ip_address: None,
    };
    let project = ProjectRepo::create_with_coordinator(
        &pool,
        2026,
        &CreateProject {
            program_id: program.id,
            title: "Peer review, at scale".to_string(),
            description: None,
            keywords: None,
            aid_requested: Some(900),
            line_id: None,
            center_id: None,
            department_id: None,
            study_id: None,
            license_id: None,
        },
        &actor,
    )
    .await
    .unwrap();

    let quality = CriterionRepo::create(
        &pool,
        2026,
        &CreateCriterion {
            position: 1,
            description: "Quality".to_string(),
            kind: CriterionKind::Options,
        },
    )
    .await
    .unwrap();
    let high = CriterionRepo::create_option(
        &pool,
        quality.id,
        &CreateCriterionOption {
            position: 1,
            description: "High".to_string(),
            score: 10,
        },
    )
    .await
    .unwrap();
    let notes = CriterionRepo::create(
        &pool,
        2026,
        &CreateCriterion {
            position: 2,
            description: "Notes".to_string(),
            kind: CriterionKind::Text,
        },
    )
    .await
    .unwrap();

    ValuationRepo::upsert(
        &pool,
        project.id,
        user.id,
        &UpsertValuation {
            criterion_id: quality.id,
            option_id: Some(high.id),
            text: None,
        },
    )
    .await
    .unwrap();
    ValuationRepo::upsert(
        &pool,
        project.id,
        user.id,
        &UpsertValuation {
            criterion_id: notes.id,
            option_id: None,
            text: Some("<p>Strong <b>team</b></p>".to_string()),
        },
    )
    .await
    .unwrap();

    let summaries = ExportRepo::project_summaries(&pool, 2026).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].participant_count, 1);
    assert_eq!(summaries[0].program, "PIEC");

    let matrix = ExportRepo::valuation_matrix(&pool, 2026).await.unwrap();
    let table = valuation_table(&matrix.projects, &matrix.criteria, &matrix.cells);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1][3], "10");
    assert!(table.rows[1][4].contains("Strong"));
    assert!(!table.rows[1][4].contains("<p>"));
}
