pub mod admin;
pub mod auth;
pub mod calls;
pub mod exports;
pub mod health;
pub mod pages;
pub mod projects;
pub mod reference;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/sso/login                                  IdP redirect URL (public)
/// /auth/sso/metadata                               SP metadata (public)
/// /auth/sso/callback                               signed assertion -> tokens (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
///
/// /home                                            current call and own projects
/// /help                                            static help topics
///
/// /centers, /departments, /studies, /licenses      list, create
/// /centers/{id} ...                                update, delete
///
/// /calls                                           list, create
/// /calls/{year}                                    get, update, delete
/// /calls/{year}/projects                           list by status (staff)
/// /calls/{year}/programs                           list, create
/// /calls/{year}/criteria                           list, create
/// /calls/{year}/report-sections                    list, create
/// /programs/{id}                                   get, update, delete
/// /programs/{id}/lines                             list, create
/// /lines/{id}                                      update, delete
/// /criteria/{id}/options                           create
/// /report-sections/{id}/subsections                create
///
/// /projects                                        list own, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/fields/{field}                    edit one field (PATCH)
/// /projects/{id}/transitions                       workflow transition (POST)
/// /projects/{id}/sign-off/{center|study}           sign-off (POST)
/// /projects/{id}/financial-closure                 close (POST)
/// /projects/{id}/events                            audit log
/// /projects/{id}/participants                      list, invite
/// /projects/{id}/participants/{user_id}            remove
/// /projects/{id}/invitation/{accept|decline}       answer an invitation (POST)
/// /projects/{id}/co-coordinator                    designate (PUT)
/// /projects/{id}/valuations                        list, upsert
/// /projects/{id}/report                            template with answers
/// /projects/{id}/report/{subsection_id}            text answer (PUT), PDF (POST)
///
/// /admin/users, /admin/users/{id}                  user management
/// /admin/groups, /admin/groups/{id}                permission groups
/// /admin/groups/{id}/members[/{user_id}]           group membership
///
/// /exports/{year}/projects                         project summary
/// /exports/{year}/valuations                       valuation matrix
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication (SSO, refresh, logout).
        .nest("/auth", auth::router())
        // Landing and help pages.
        .merge(pages::router())
        // Reference data.
        .nest("/centers", reference::centers_router())
        .nest("/departments", reference::departments_router())
        .nest("/studies", reference::studies_router())
        .nest("/licenses", reference::licenses_router())
        // Calls with their programs, lines, rubric and report template.
        .nest("/calls", calls::router())
        .nest("/programs", calls::programs_router())
        .nest("/lines", calls::lines_router())
        .nest("/criteria", calls::criteria_router())
        .nest("/report-sections", calls::report_sections_router())
        // Projects, team, valuations and final report.
        .nest("/projects", projects::router())
        // Administration.
        .nest("/admin", admin::router())
        // Spreadsheet exports.
        .nest("/exports", exports::router())
}
