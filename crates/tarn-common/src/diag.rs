//! Wire-level diagnostics.
//!
//! [`Diagnostic`] is the flat shape every compiler stage reports defects in
//! and the only thing the CLI/IDE layer consumes: a severity, a rendered
//! message, and an optional source span. Stages with richer internal error
//! types (the semantic analyzer in particular) lower into this shape at
//! their boundary.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// How serious a diagnostic is.
///
/// Every diagnostic emitted today is an [`Severity::Error`]; `Warning` is
/// reserved so the wire shape does not change when warnings appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One reported defect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Diagnostic {
    /// An error diagnostic with a source span.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span: Some(span),
        }
    }

    /// An error diagnostic with no usable source position (unit-level
    /// defects such as a malformed package name).
    pub fn error_unspanned(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Whether any diagnostic in `diags` blocks downstream stages.
///
/// This is the single gate the driver consults before code generation.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_severity() {
        let d = Diagnostic::error("unrecognized name `foo`", Span::new(3, 6));
        assert_eq!(d.to_string(), "error: unrecognized name `foo`");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let warn = Diagnostic {
            severity: Severity::Warning,
            message: "unused".into(),
            span: None,
        };
        assert!(!has_errors(&[warn.clone()]));
        assert!(has_errors(&[warn, Diagnostic::error_unspanned("boom")]));
    }

    #[test]
    fn serializes_to_wire_shape() {
        let d = Diagnostic::error("type mismatch", Span::new(1, 4));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "severity": "error",
                "message": "type mismatch",
                "span": { "start": 1, "end": 4 },
            })
        );
    }

    #[test]
    fn unspanned_diagnostic_omits_span() {
        let d = Diagnostic::error_unspanned("invalid package name `1st`");
        let json = serde_json::to_value(&d).unwrap();
        assert!(json.get("span").is_none());
    }
}
