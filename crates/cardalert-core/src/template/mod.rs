//! Bank alert templates and the registry that holds them.
//!
//! A template is pure data: a validation marker identifying one bank's alert
//! email plus one single-capture regex per transaction field and a chrono
//! date layout. Supporting a new bank, or fixing a changed email format, is a
//! template change rather than a code change.

pub mod builtin;
mod registry;

pub use registry::{builtin_registry, TemplateRegistry};

use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::models::transaction::Field;

/// One institution's alert-email format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTemplate {
    /// Identifier used in logs and diagnostics.
    pub name: String,

    /// Literal text whose presence marks an email as this template's.
    pub validation_marker: String,

    pub last_four_digits_pattern: String,
    pub amount_pattern: String,
    pub merchant_pattern: String,
    pub date_pattern: String,

    /// chrono `strftime` layout for the string captured by `date_pattern`.
    pub date_layout: String,
}

impl BankTemplate {
    /// The extraction pattern for `field`.
    pub fn pattern(&self, field: Field) -> &str {
        match field {
            Field::LastFourDigits => &self.last_four_digits_pattern,
            Field::Date => &self.date_pattern,
            Field::Amount => &self.amount_pattern,
            Field::Merchant => &self.merchant_pattern,
        }
    }

    /// Whether this template's marker appears in `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.validation_marker.as_str())
    }

    /// Check the template is well formed, returning every defect found.
    pub fn validate(&self) -> Vec<TemplateError> {
        let mut errors = Vec::new();

        if self.validation_marker.is_empty() {
            errors.push(TemplateError::EmptyMarker {
                template: self.name.clone(),
            });
        }

        for field in Field::ALL {
            match Regex::new(self.pattern(field)) {
                Ok(re) => {
                    let found = re.captures_len() - 1;
                    if found != 1 {
                        errors.push(TemplateError::CaptureGroups {
                            template: self.name.clone(),
                            field,
                            found,
                        });
                    }
                }
                Err(source) => errors.push(TemplateError::InvalidPattern {
                    template: self.name.clone(),
                    field,
                    source,
                }),
            }
        }

        let layout_ok = !self.date_layout.is_empty()
            && StrftimeItems::new(&self.date_layout).all(|item| !matches!(item, Item::Error));
        if !layout_ok {
            errors.push(TemplateError::InvalidDateLayout {
                template: self.name.clone(),
                layout: self.date_layout.clone(),
            });
        }

        errors
    }
}
