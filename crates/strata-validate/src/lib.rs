//! Standalone descriptor validation
//!
//! Inspects a descriptor (base or extension) and reports a list of issues,
//! each with a message and a source line. Unlike the merge engine, which
//! fails fast on the first problem, validation accumulates every finding
//! so a descriptor author can fix them in one pass.
//!
//! Line attribution is best-effort: semantic issues point at the first
//! source line mentioning the offending name, and syntax issues carry the
//! parser's own location. Line 0 means the location could not be
//! determined.

mod semantic;

use regex_lite::Regex;
use serde::Serialize;

use strata_model::{Document, ExtensionDocument};

pub use semantic::{validate_parsed_document, validate_parsed_extension};

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,

    /// 1-based source line, or 0 when unknown.
    pub line: usize,
}

impl ValidationIssue {
    fn new(message: String, line: usize) -> Self {
        ValidationIssue { message, line }
    }
}

/// Identifier rule for document, module, resource, interface, and hook
/// names.
const NAME_PATTERN: &str = r"^[A-Za-z0-9_\-\.]+$";

pub(crate) fn is_valid_name(value: &str) -> bool {
    Regex::new(NAME_PATTERN)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// Validate a base descriptor from its raw YAML source.
///
/// A syntax error short-circuits: semantic checks need a parsed document.
pub fn validate_document(source: &str) -> Vec<ValidationIssue> {
    match Document::from_str(source) {
        Err(err) => vec![syntax_issue(&err)],
        Ok(document) => validate_parsed_document(&document, source),
    }
}

/// Validate an extension descriptor from its raw YAML source.
pub fn validate_extension(source: &str) -> Vec<ValidationIssue> {
    match ExtensionDocument::from_str(source) {
        Err(err) => vec![syntax_issue(&err)],
        Ok(extension) => validate_parsed_extension(&extension, source),
    }
}

fn syntax_issue(err: &strata_model::ModelError) -> ValidationIssue {
    let (strata_model::ModelError::Document(cause)
    | strata_model::ModelError::Extension(cause)) = err;
    let line = cause.location().map(|loc| loc.line()).unwrap_or(0);
    ValidationIssue::new(format!("{err}: {cause}"), line)
}

/// First 1-based source line containing `needle`, or 0.
pub(crate) fn line_of(source: &str, needle: &str) -> usize {
    source
        .lines()
        .position(|line| line.contains(needle))
        .map(|index| index + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_descriptor_has_no_issues() {
        let issues = validate_document(
            "id: shop\nversion: 1.0.0\nmodules:\n  - name: web\n",
        );
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn syntax_error_reports_parser_location() {
        let issues = validate_document("id: shop\nmodules:\n  - name: [broken\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("could not deserialize"));
        assert!(issues[0].line > 0);
    }

    #[test]
    fn name_pattern_accepts_typical_identifiers() {
        assert!(is_valid_name("shop"));
        assert!(is_valid_name("shop-backend_v2.1"));
        assert!(!is_valid_name("shop backend"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn line_lookup_is_one_based() {
        let source = "id: shop\nmodules:\n  - name: web\n";
        assert_eq!(line_of(source, "name: web"), 3);
        assert_eq!(line_of(source, "missing"), 0);
    }
}
