//! Spreadsheet exports of a call year, as JSON tables or CSV.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use grantdesk_core::export::{summary_table, valuation_table, Table};
use grantdesk_core::permissions::EXPORT_DATA;
use grantdesk_core::types::CallYear;
use grantdesk_db::repositories::ExportRepo;

use super::load_call;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::query::{ExportFormat, ExportParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/exports/{year}/projects
///
/// One row per project of the call, after a header row.
pub async fn export_projects(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    caller.require(EXPORT_DATA)?;
    load_call(&state, year).await?;

    let summaries = ExportRepo::project_summaries(&state.pool, year).await?;
    let table = summary_table(&summaries);

    tracing::info!(year, rows = table.rows.len() - 1, user_id = caller.id(), "Project summary exported");
    Ok(render(table, params.format, &format!("projects-{year}.csv")))
}

/// GET /api/v1/exports/{year}/valuations
///
/// One row per project with one column per criterion.
pub async fn export_valuations(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    caller.require(EXPORT_DATA)?;
    load_call(&state, year).await?;

    let matrix = ExportRepo::valuation_matrix(&state.pool, year).await?;
    let table = valuation_table(&matrix.projects, &matrix.criteria, &matrix.cells);

    tracing::info!(year, rows = table.rows.len() - 1, user_id = caller.id(), "Valuation matrix exported");
    Ok(render(table, params.format, &format!("valuations-{year}.csv")))
}

fn render(table: Table, format: ExportFormat, filename: &str) -> Response {
    match format {
        ExportFormat::Json => Json(DataResponse { data: table }).into_response(),
        ExportFormat::Csv => (
            [
                (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            table.to_csv(),
        )
            .into_response(),
    }
}
