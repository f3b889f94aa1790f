//! Route definitions for the `/projects` resource and everything scoped to a
//! single project: team, valuations and final report.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use grantdesk_core::uploads::MAX_ATTACHMENT_BYTES;

use crate::handlers::{evaluation, participants, projects, reports};
use crate::state::AppState;

/// Headroom over the attachment cap for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                -> list_my_projects
/// POST   /                                -> create_project
/// GET    /{id}                            -> get_project
/// PUT    /{id}                            -> update_project (draft only)
/// DELETE /{id}                            -> delete_project (draft only)
/// PATCH  /{id}/fields/{field}             -> edit_field
/// POST   /{id}/transitions                -> transition
/// POST   /{id}/sign-off/center            -> sign_off_center
/// POST   /{id}/sign-off/study             -> sign_off_study
/// POST   /{id}/financial-closure          -> close_financially
/// GET    /{id}/events                     -> list_events
///
/// GET    /{id}/participants               -> list_participants
/// POST   /{id}/participants               -> invite
/// DELETE /{id}/participants/{user_id}     -> remove_participant
/// POST   /{id}/invitation/accept          -> accept_invitation
/// POST   /{id}/invitation/decline         -> decline_invitation
/// PUT    /{id}/co-coordinator             -> designate_co_coordinator
///
/// GET    /{id}/valuations                 -> list_valuations
/// PUT    /{id}/valuations                 -> upsert_valuation
///
/// GET    /{id}/report                     -> get_report
/// PUT    /{id}/report/{subsection_id}     -> put_text_answer
/// POST   /{id}/report/{subsection_id}     -> upload_file_answer (multipart, PDF)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(projects::list_my_projects).post(projects::create_project),
        )
        .route(
            "/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/{id}/fields/{field}", patch(projects::edit_field))
        .route("/{id}/transitions", post(projects::transition))
        .route("/{id}/sign-off/center", post(projects::sign_off_center))
        .route("/{id}/sign-off/study", post(projects::sign_off_study))
        .route("/{id}/financial-closure", post(projects::close_financially))
        .route("/{id}/events", get(projects::list_events))
        // Team
        .route(
            "/{id}/participants",
            get(participants::list_participants).post(participants::invite),
        )
        .route(
            "/{id}/participants/{user_id}",
            delete(participants::remove_participant),
        )
        .route(
            "/{id}/invitation/accept",
            post(participants::accept_invitation),
        )
        .route(
            "/{id}/invitation/decline",
            post(participants::decline_invitation),
        )
        .route(
            "/{id}/co-coordinator",
            put(participants::designate_co_coordinator),
        )
        // Evaluation
        .route(
            "/{id}/valuations",
            get(evaluation::list_valuations).put(evaluation::upsert_valuation),
        )
        // Final report
        .route("/{id}/report", get(reports::get_report))
        .route(
            "/{id}/report/{subsection_id}",
            put(reports::put_text_answer)
                .post(reports::upload_file_answer)
                .layer(DefaultBodyLimit::max(
                    MAX_ATTACHMENT_BYTES + MULTIPART_OVERHEAD_BYTES,
                )),
        )
}
