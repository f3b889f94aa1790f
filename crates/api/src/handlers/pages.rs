//! Landing and help endpoints.

use axum::extract::State;
use axum::Json;
use grantdesk_core::deadlines::CallDeadlines;
use grantdesk_db::models::call::Call;
use grantdesk_db::models::project::UserProject;
use grantdesk_db::models::user::User;
use grantdesk_db::repositories::{CallRepo, ProjectRepo};
use serde::Serialize;

use super::today;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

const HELP_TOPICS: &[HelpTopic] = &[
    HelpTopic {
        title: "Creating a proposal",
        body: "Open the current call, pick a program and fill in the project form. \
               You become the coordinator of the new project.",
    },
    HelpTopic {
        title: "Building the team",
        body: "While the project is a draft, invite colleagues and students by their NIP. \
               Invitees must accept before they count as participants.",
    },
    HelpTopic {
        title: "Submitting",
        body: "Submit between the opening and closing dates of the call. \
               Center and study sign-offs follow if the program requires them.",
    },
    HelpTopic {
        title: "Final report",
        body: "After accepting the committee decision, answer every section of the final \
               report (text or PDF) and submit it before the report deadline.",
    },
];

#[derive(Debug, Serialize)]
pub struct HelpTopic {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Home {
    pub user: User,
    pub permissions: Vec<String>,
    pub call: Option<Call>,
    pub deadlines: Option<CallDeadlines>,
    pub projects: Vec<UserProject>,
}

/// GET /api/v1/home
///
/// The current call with its deadlines and the caller's projects.
pub async fn home(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Home>>> {
    let call = CallRepo::current(&state.pool, today()).await?;
    let projects = ProjectRepo::list_for_user(&state.pool, caller.id()).await?;

    Ok(Json(DataResponse {
        data: Home {
            permissions: caller.permissions.codes(),
            deadlines: call.as_ref().map(Call::deadlines),
            call,
            projects,
            user: caller.user,
        },
    }))
}

/// GET /api/v1/help
pub async fn help() -> Json<DataResponse<&'static [HelpTopic]>> {
    Json(DataResponse { data: HELP_TOPICS })
}
