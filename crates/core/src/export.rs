//! Tabular exports for spreadsheet consumers.
//!
//! A [`Table`] is a header row followed by data rows, all as strings. The
//! builders here take already-loaded rows so the layout can be tested without
//! a database.

use std::collections::HashMap;

use serde::Serialize;

use crate::status::ProjectStatus;
use crate::types::{DbId, Euros};

/// Line width used when flattening rich text.
const TEXT_WIDTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn with_header<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            rows: vec![header.into_iter().map(Into::into).collect()],
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Render as RFC 4180 CSV (CRLF line endings).
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|cell| csv_escape(cell)).collect();
            out.push_str(&line.join(","));
            out.push_str("\r\n");
        }
        out
    }
}

fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Convert an HTML fragment to plain text. Falls back to the raw input when
/// the fragment cannot be parsed.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), TEXT_WIDTH) {
        Ok(text) => text.trim().to_string(),
        Err(_) => html.trim().to_string(),
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Project summary
// ---------------------------------------------------------------------------

/// One flattened project, as loaded by the summary query.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: DbId,
    pub program: String,
    pub line: Option<String>,
    pub title: String,
    pub coordinator_name: Option<String>,
    pub coordinator_email: Option<String>,
    pub center: Option<String>,
    pub department: Option<String>,
    pub study: Option<String>,
    pub status: ProjectStatus,
    pub aid_requested: Option<Euros>,
    pub aid_granted: Option<Euros>,
    pub is_financially_closed: bool,
    pub participant_count: i64,
}

pub const SUMMARY_HEADER: [&str; 14] = [
    "id",
    "program",
    "line",
    "title",
    "coordinator",
    "coordinator_email",
    "center",
    "department",
    "study",
    "status",
    "aid_requested",
    "aid_granted",
    "financially_closed",
    "participants",
];

pub fn summary_table(projects: &[ProjectSummary]) -> Table {
    let mut table = Table::with_header(SUMMARY_HEADER);
    for p in projects {
        table.push(vec![
            p.id.to_string(),
            p.program.clone(),
            opt(p.line.as_deref()),
            p.title.clone(),
            opt(p.coordinator_name.as_deref()),
            opt(p.coordinator_email.as_deref()),
            opt(p.center.as_deref()),
            opt(p.department.as_deref()),
            opt(p.study.as_deref()),
            p.status.code().to_string(),
            opt(p.aid_requested),
            opt(p.aid_granted),
            if p.is_financially_closed { "yes" } else { "no" }.to_string(),
            p.participant_count.to_string(),
        ]);
    }
    table
}

// ---------------------------------------------------------------------------
// Valuation matrix
// ---------------------------------------------------------------------------

/// A criterion column, in display order.
#[derive(Debug, Clone)]
pub struct CriterionColumn {
    pub id: DbId,
    pub position: i32,
    pub description: String,
}

/// A project row head.
#[derive(Debug, Clone)]
pub struct ProjectHead {
    pub id: DbId,
    pub program: String,
    pub title: String,
}

/// One valuation cell: either an option score or rich text.
#[derive(Debug, Clone)]
pub struct ValuationCell {
    pub project_id: DbId,
    pub criterion_id: DbId,
    pub score: Option<i32>,
    pub text: Option<String>,
}

pub fn valuation_table(
    projects: &[ProjectHead],
    criteria: &[CriterionColumn],
    cells: &[ValuationCell],
) -> Table {
    let mut columns: Vec<&CriterionColumn> = criteria.iter().collect();
    columns.sort_by_key(|c| (c.position, c.id));

    let mut header = vec!["id".to_string(), "program".to_string(), "title".to_string()];
    header.extend(
        columns
            .iter()
            .map(|c| format!("{}. {}", c.position, c.description)),
    );
    let mut table = Table { rows: vec![header] };

    let by_key: HashMap<(DbId, DbId), &ValuationCell> = cells
        .iter()
        .map(|c| ((c.project_id, c.criterion_id), c))
        .collect();

    for p in projects {
        let mut row = vec![p.id.to_string(), p.program.clone(), p.title.clone()];
        for c in &columns {
            let cell = match by_key.get(&(p.id, c.id)) {
                Some(v) => match (v.score, v.text.as_deref()) {
                    (Some(score), _) => score.to_string(),
                    (None, Some(text)) => html_to_text(text),
                    (None, None) => String::new(),
                },
                None => String::new(),
            };
            row.push(cell);
        }
        table.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_year_yields_only_the_header() {
        let table = summary_table(&[]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.header().len(), SUMMARY_HEADER.len());

        let matrix = valuation_table(
            &[],
            &[CriterionColumn {
                id: 1,
                position: 1,
                description: "Quality".into(),
            }],
            &[],
        );
        assert_eq!(matrix.rows, vec![vec!["id", "program", "title", "1. Quality"]]);
    }

    #[test]
    fn summary_row_layout() {
        let table = summary_table(&[ProjectSummary {
            id: 7,
            program: "PIEC".into(),
            line: None,
            title: "Flipped, classroom".into(),
            coordinator_name: Some("Ana Gil".into()),
            coordinator_email: Some("ana@example.org".into()),
            center: Some("Ciencias".into()),
            department: None,
            study: None,
            status: ProjectStatus::Submitted,
            aid_requested: Some(800),
            aid_granted: None,
            is_financially_closed: false,
            participant_count: 3,
        }]);
        let row = &table.rows[1];
        assert_eq!(row[0], "7");
        assert_eq!(row[9], "submitted");
        assert_eq!(row[10], "800");
        assert_eq!(row[11], "");
        assert_eq!(row[13], "3");
        assert!(table.to_csv().contains("\"Flipped, classroom\""));
    }

    #[test]
    fn matrix_orders_columns_and_flattens_html() {
        let criteria = vec![
            CriterionColumn {
                id: 20,
                position: 2,
                description: "Comments".into(),
            },
            CriterionColumn {
                id: 10,
                position: 1,
                description: "Impact".into(),
            },
        ];
        let projects = vec![ProjectHead {
            id: 1,
            program: "PIEC".into(),
            title: "T".into(),
        }];
        let cells = vec![
            ValuationCell {
                project_id: 1,
                criterion_id: 20,
                score: None,
                text: Some("<p>Very <b>good</b></p>".into()),
            },
            ValuationCell {
                project_id: 1,
                criterion_id: 10,
                score: Some(4),
                text: None,
            },
        ];
        let table = valuation_table(&projects, &criteria, &cells);
        assert_eq!(table.rows[0][3], "1. Impact");
        assert_eq!(table.rows[1][3], "4");
        assert!(table.rows[1][4].contains("Very"));
        assert!(!table.rows[1][4].contains("<p>"));
    }

    #[test]
    fn csv_escapes_quotes() {
        let mut t = Table::with_header(["a"]);
        t.push(vec!["say \"hi\"".into()]);
        assert_eq!(t.to_csv(), "a\r\n\"say \"\"hi\"\"\"\r\n");
    }
}
