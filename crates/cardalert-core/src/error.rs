//! Error types for the cardalert-core library.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::models::transaction::Field;

/// Main error type for the cardalert library.
#[derive(Error, Debug)]
pub enum CardAlertError {
    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Template definition or loading error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while turning an alert email into a transaction.
///
/// Every variant carries enough context (template, field, raw capture) for
/// the caller to log or alert on without re-running the extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// HTML to plain text conversion failed.
    #[error("failed to convert markup to text: {reason}")]
    MarkupConversionFailed { reason: String },

    /// No registered template's validation marker appears in the text.
    #[error("email does not match any template ({} characters of text)", .text.len())]
    NoMatchingTemplate {
        /// The full normalized text, for diagnostics.
        text: String,
    },

    /// A template pattern failed to compile or has the wrong shape.
    #[error("template {template}: cannot compile {field} pattern {pattern:?}: {reason}")]
    PatternCompileFailed {
        template: String,
        field: Field,
        pattern: String,
        reason: String,
    },

    /// A field pattern found nothing in the text.
    #[error("template {template}: could not find {field} in email")]
    FieldNotFound { template: String, field: Field },

    /// The captured card digits are not a number in 0..=9999.
    #[error("invalid last four digits: {raw:?}")]
    InvalidDigits { raw: String },

    /// The captured date does not parse with the template's layout.
    #[error("invalid date {raw:?} for layout {layout:?}: {source}")]
    InvalidDate {
        raw: String,
        layout: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The captured amount is not a non-negative decimal.
    #[error("invalid amount {raw:?}: {reason}")]
    InvalidAmount { raw: String, reason: String },
}

impl ExtractionError {
    /// The payload-free kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MarkupConversionFailed { .. } => ErrorKind::MarkupConversionFailed,
            Self::NoMatchingTemplate { .. } => ErrorKind::NoMatchingTemplate,
            Self::PatternCompileFailed { .. } => ErrorKind::PatternCompileFailed,
            Self::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            Self::InvalidDigits { .. } => ErrorKind::InvalidDigits,
            Self::InvalidDate { .. } => ErrorKind::InvalidDate,
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
        }
    }

    /// The transaction field this error concerns, when there is one.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::PatternCompileFailed { field, .. } | Self::FieldNotFound { field, .. } => {
                Some(*field)
            }
            Self::InvalidDigits { .. } => Some(Field::LastFourDigits),
            Self::InvalidDate { .. } => Some(Field::Date),
            Self::InvalidAmount { .. } => Some(Field::Amount),
            Self::MarkupConversionFailed { .. } | Self::NoMatchingTemplate { .. } => None,
        }
    }
}

/// Kind of an [`ExtractionError`], without its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MarkupConversionFailed,
    NoMatchingTemplate,
    PatternCompileFailed,
    FieldNotFound,
    InvalidDigits,
    InvalidDate,
    InvalidAmount,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkupConversionFailed => "markup_conversion_failed",
            Self::NoMatchingTemplate => "no_matching_template",
            Self::PatternCompileFailed => "pattern_compile_failed",
            Self::FieldNotFound => "field_not_found",
            Self::InvalidDigits => "invalid_digits",
            Self::InvalidDate => "invalid_date",
            Self::InvalidAmount => "invalid_amount",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors in template definitions or template files.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Failed to read a template file.
    #[error("failed to read template file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a template file.
    #[error("failed to parse template file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The validation marker is empty and would match every email.
    #[error("template {template}: validation marker is empty")]
    EmptyMarker { template: String },

    /// A field pattern is not a valid regex.
    #[error("template {template}: invalid {field} pattern: {source}")]
    InvalidPattern {
        template: String,
        field: Field,
        #[source]
        source: regex::Error,
    },

    /// A field pattern does not have exactly one capture group.
    #[error("template {template}: {field} pattern has {found} capture groups, expected 1")]
    CaptureGroups {
        template: String,
        field: Field,
        found: usize,
    },

    /// The date layout contains an unknown format specifier.
    #[error("template {template}: invalid date layout {layout:?}")]
    InvalidDateLayout { template: String, layout: String },
}

/// Result type for the cardalert library.
pub type Result<T> = std::result::Result<T, CardAlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_field() {
        let err = ExtractionError::FieldNotFound {
            template: "Chase".to_string(),
            field: Field::Amount,
        };
        assert_eq!(err.kind(), ErrorKind::FieldNotFound);
        assert_eq!(err.field(), Some(Field::Amount));
        assert_eq!(err.to_string(), "template Chase: could not find amount in email");

        let err = ExtractionError::NoMatchingTemplate {
            text: "hello".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NoMatchingTemplate);
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_kind_display_matches_serde() {
        let json = serde_json::to_string(&ErrorKind::InvalidDate).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorKind::InvalidDate));
    }

    #[test]
    fn test_no_matching_template_does_not_dump_text() {
        let err = ExtractionError::NoMatchingTemplate {
            text: "a very private email body".to_string(),
        };
        assert!(!err.to_string().contains("private"));
    }
}
