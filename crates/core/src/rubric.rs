//! Evaluation criteria and final-report subsections: answer kinds and the
//! rule that every stored answer matches its kind.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// How a criterion is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    /// Pick one of the criterion's scored options.
    Options,
    /// Free rich text.
    Text,
}

/// How a report subsection is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsectionKind {
    Text,
    /// An uploaded PDF.
    File,
}

impl CriterionKind {
    pub fn code(self) -> &'static str {
        match self {
            CriterionKind::Options => "options",
            CriterionKind::Text => "text",
        }
    }
}

impl SubsectionKind {
    pub fn code(self) -> &'static str {
        match self {
            SubsectionKind::Text => "text",
            SubsectionKind::File => "file",
        }
    }
}

impl FromStr for CriterionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "options" => Ok(CriterionKind::Options),
            "text" => Ok(CriterionKind::Text),
            other => Err(CoreError::field(
                "kind",
                format!("unknown criterion kind '{other}'"),
            )),
        }
    }
}

impl FromStr for SubsectionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SubsectionKind::Text),
            "file" => Ok(SubsectionKind::File),
            other => Err(CoreError::field(
                "kind",
                format!("unknown subsection kind '{other}'"),
            )),
        }
    }
}

/// A valuation as submitted by an evaluator.
#[derive(Debug, Clone, Copy)]
pub struct ValuationInput<'a> {
    pub option_id: Option<DbId>,
    pub text: Option<&'a str>,
    /// Whether `option_id` is one of the criterion's own options.
    pub option_belongs: bool,
}

/// Exactly one of option / text, matching the criterion kind.
pub fn check_valuation(kind: CriterionKind, input: &ValuationInput<'_>) -> Result<(), CoreError> {
    match (kind, input.option_id, input.text) {
        (CriterionKind::Options, Some(_), None) => {
            if input.option_belongs {
                Ok(())
            } else {
                Err(CoreError::field(
                    "option_id",
                    "the option does not belong to this criterion",
                ))
            }
        }
        (CriterionKind::Options, _, _) => Err(CoreError::field(
            "option_id",
            "this criterion is answered by choosing one option",
        )),
        (CriterionKind::Text, None, Some(text)) if !text.trim().is_empty() => Ok(()),
        (CriterionKind::Text, _, _) => Err(CoreError::field(
            "text",
            "this criterion is answered with a non-empty text",
        )),
    }
}

/// A text answer may only be stored on a text subsection, and must not be blank.
pub fn check_text_answer(kind: SubsectionKind, text: &str) -> Result<(), CoreError> {
    if kind != SubsectionKind::Text {
        return Err(CoreError::field(
            "text",
            "this subsection is answered by uploading a PDF",
        ));
    }
    if text.trim().is_empty() {
        return Err(CoreError::field("text", "must not be empty"));
    }
    Ok(())
}

/// A file answer may only be stored on a file subsection.
pub fn check_file_answer(kind: SubsectionKind) -> Result<(), CoreError> {
    if kind == SubsectionKind::File {
        Ok(())
    } else {
        Err(CoreError::field(
            "file",
            "this subsection is answered with text",
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn kinds_parse_from_codes() {
        assert_eq!("options".parse::<CriterionKind>().unwrap(), CriterionKind::Options);
        assert_eq!("file".parse::<SubsectionKind>().unwrap(), SubsectionKind::File);
        assert_matches!("scale".parse::<CriterionKind>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn option_criterion_needs_own_option() {
        let ok = ValuationInput {
            option_id: Some(3),
            text: None,
            option_belongs: true,
        };
        assert!(check_valuation(CriterionKind::Options, &ok).is_ok());

        let foreign = ValuationInput {
            option_belongs: false,
            ..ok
        };
        assert_matches!(
            check_valuation(CriterionKind::Options, &foreign),
            Err(CoreError::Validation(msg)) if msg.starts_with("option_id")
        );

        let both = ValuationInput {
            text: Some("also text"),
            ..ok
        };
        assert!(check_valuation(CriterionKind::Options, &both).is_err());
    }

    #[test]
    fn text_criterion_needs_text_only() {
        let text = ValuationInput {
            option_id: None,
            text: Some("<p>Solid plan</p>"),
            option_belongs: false,
        };
        assert!(check_valuation(CriterionKind::Text, &text).is_ok());

        let blank = ValuationInput {
            text: Some("  "),
            ..text
        };
        assert!(check_valuation(CriterionKind::Text, &blank).is_err());
    }

    #[test]
    fn answers_match_subsection_kind() {
        assert!(check_text_answer(SubsectionKind::Text, "Done").is_ok());
        assert!(check_text_answer(SubsectionKind::File, "Done").is_err());
        assert!(check_file_answer(SubsectionKind::File).is_ok());
        assert!(check_file_answer(SubsectionKind::Text).is_err());
    }
}
