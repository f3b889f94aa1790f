//! Final-report attachments: PDF-only validation and storage layout.
//!
//! Files live at `{media_root}/reports/{year}/{project_id}/{subsection_id}-{name}.pdf`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::{CallYear, DbId};

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Largest accepted attachment, in bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Stem length kept after sanitizing.
const MAX_STEM_LEN: usize = 80;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

/// Validate an uploaded attachment: `.pdf` extension, PDF magic bytes, size.
pub fn validate_pdf(filename: &str, bytes: &[u8]) -> Result<(), CoreError> {
    let is_pdf_name = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err(CoreError::field("file", "only PDF files are accepted"));
    }
    if bytes.is_empty() {
        return Err(CoreError::field("file", "the file is empty"));
    }
    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(CoreError::field(
            "file",
            format!("the file exceeds {} MiB", MAX_ATTACHMENT_BYTES / (1024 * 1024)),
        ));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(CoreError::field("file", "the file is not a valid PDF document"));
    }
    Ok(())
}

/// Reduce a client-provided filename to a safe stem.
pub fn sanitize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned = UNSAFE_CHARS.replace_all(stem, "_");
    let trimmed: String = cleaned.trim_matches('_').chars().take(MAX_STEM_LEN).collect();
    if trimmed.is_empty() {
        "attachment".to_string()
    } else {
        trimmed
    }
}

/// Path of an attachment relative to the media root.
pub fn attachment_relative_path(
    year: CallYear,
    project_id: DbId,
    subsection_id: DbId,
    filename: &str,
) -> PathBuf {
    PathBuf::from("reports")
        .join(year.to_string())
        .join(project_id.to_string())
        .join(format!("{subsection_id}-{}.pdf", sanitize_stem(filename)))
}

/// Path of the rendered report snapshot relative to the media root.
pub fn snapshot_relative_path(year: CallYear, project_id: DbId) -> PathBuf {
    PathBuf::from("reports")
        .join(year.to_string())
        .join(project_id.to_string())
        .join("report.html")
}
