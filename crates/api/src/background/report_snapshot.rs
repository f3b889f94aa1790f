//! Renders a submitted final report into a standalone HTML file.
//!
//! The snapshot freezes the answers as they were at submission time and is
//! written to `reports/{year}/{project_id}/report.html` under the media root.

use std::fmt::Write as _;
use std::path::PathBuf;

use grantdesk_core::export::html_to_text;
use grantdesk_core::uploads::snapshot_relative_path;
use grantdesk_db::models::project::Project;
use grantdesk_db::models::report::{ReportAnswer, SectionWithSubsections};
use grantdesk_db::repositories::ReportRepo;
use grantdesk_db::DbPool;

/// Spawn the snapshot job for `project`. Failures are logged, never surfaced.
pub fn spawn(pool: DbPool, media_root: PathBuf, project: Project) {
    tokio::spawn(async move {
        let project_id = project.id;
        match write_snapshot(&pool, &media_root, &project).await {
            Ok(path) => {
                tracing::info!(project_id, path = %path.display(), "Report snapshot written");
            }
            Err(e) => {
                tracing::error!(project_id, error = %e, "Report snapshot failed");
            }
        }
    });
}

async fn write_snapshot(
    pool: &DbPool,
    media_root: &std::path::Path,
    project: &Project,
) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    let template = ReportRepo::template(pool, project.call_year).await?;
    let answers = ReportRepo::answers(pool, project.id).await?;
    let html = render(project, &template, &answers);

    let path = media_root.join(snapshot_relative_path(project.call_year, project.id));
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, html).await?;
    Ok(path)
}

/// Build the HTML document. Rich-text answers are flattened to plain text
/// and, like everything else taken from the database, escaped.
pub fn render(
    project: &Project,
    template: &[SectionWithSubsections],
    answers: &[ReportAnswer],
) -> String {
    let mut out = String::new();
    let title = escape(&project.title);

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>Call {} &middot; project {}</p>\n",
        project.call_year, project.id,
    );

    for entry in template {
        let _ = writeln!(out, "<h2>{}</h2>", escape(&entry.section.title));
        for sub in &entry.subsections {
            let _ = writeln!(out, "<h3>{}</h3>", escape(&sub.title));
            let answer = answers.iter().find(|a| a.subsection_id == sub.id);
            match answer {
                Some(ReportAnswer { text: Some(text), .. }) => {
                    let _ = writeln!(
                        out,
                        "<div class=\"answer\" style=\"white-space: pre-wrap\">{}</div>",
                        escape(&html_to_text(text)),
                    );
                }
                Some(ReportAnswer { file_path: Some(path), .. }) => {
                    let path = escape(path);
                    let _ = writeln!(out, "<p class=\"attachment\"><a href=\"{path}\">{path}</a></p>");
                }
                _ => out.push_str("<p class=\"missing\">No answer</p>\n"),
            }
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
