//! Route definitions for calls, their programs and lines, and the per-call
//! rubric and report template.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{calls, evaluation, reports};
use crate::state::AppState;

/// Routes mounted at `/calls`.
///
/// ```text
/// GET    /                         -> list_calls
/// POST   /                         -> create_call
/// GET    /{year}                   -> get_call (with programs and lines)
/// PUT    /{year}                   -> update_call
/// DELETE /{year}                   -> delete_call
/// GET    /{year}/projects          -> list_call_projects (?status, staff)
/// GET    /{year}/programs          -> list_programs
/// POST   /{year}/programs          -> create_program
/// GET    /{year}/criteria          -> list_criteria
/// POST   /{year}/criteria          -> create_criterion
/// GET    /{year}/report-sections   -> list_sections
/// POST   /{year}/report-sections   -> create_section
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(calls::list_calls).post(calls::create_call))
        .route(
            "/{year}",
            get(calls::get_call)
                .put(calls::update_call)
                .delete(calls::delete_call),
        )
        .route("/{year}/projects", get(calls::list_call_projects))
        .route(
            "/{year}/programs",
            get(calls::list_programs).post(calls::create_program),
        )
        .route(
            "/{year}/criteria",
            get(evaluation::list_criteria).post(evaluation::create_criterion),
        )
        .route(
            "/{year}/report-sections",
            get(reports::list_sections).post(reports::create_section),
        )
}

/// Routes mounted at `/programs`.
///
/// ```text
/// GET    /{id}         -> get_program (with lines)
/// PUT    /{id}         -> update_program
/// DELETE /{id}         -> delete_program
/// GET    /{id}/lines   -> list_lines
/// POST   /{id}/lines   -> create_line
/// ```
pub fn programs_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(calls::get_program)
                .put(calls::update_program)
                .delete(calls::delete_program),
        )
        .route(
            "/{id}/lines",
            get(calls::list_lines).post(calls::create_line),
        )
}

/// Routes mounted at `/lines`.
pub fn lines_router() -> Router<AppState> {
    Router::new().route("/{id}", put(calls::update_line).delete(calls::delete_line))
}

/// Routes mounted at `/criteria`.
pub fn criteria_router() -> Router<AppState> {
    Router::new().route("/{id}/options", post(evaluation::create_option))
}

/// Routes mounted at `/report-sections`.
pub fn report_sections_router() -> Router<AppState> {
    Router::new().route("/{id}/subsections", post(reports::create_subsection))
}
