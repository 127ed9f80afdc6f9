//! Raw field capture using a template's patterns.

use regex::Regex;
use tracing::trace;

use super::Result;
use crate::error::ExtractionError;
use crate::models::transaction::Field;
use crate::template::BankTemplate;

/// Field substrings as captured, before any type conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFields {
    pub last_four_digits: String,
    pub date: String,
    pub amount: String,
    pub merchant: String,
}

/// Capture one field: compile its pattern, take group 1 of the first match
/// anywhere in `text`, and strip trailing `\r`/`\n`. Everything else,
/// including leading and inner whitespace, is kept.
pub fn extract_field(text: &str, template: &BankTemplate, field: Field) -> Result<String> {
    let pattern = template.pattern(field);
    let compile_failed = |reason: String| ExtractionError::PatternCompileFailed {
        template: template.name.clone(),
        field,
        pattern: pattern.to_string(),
        reason,
    };

    let re = Regex::new(pattern).map_err(|e| compile_failed(e.to_string()))?;
    if re.captures_len() != 2 {
        return Err(compile_failed(format!(
            "expected exactly one capture group, found {}",
            re.captures_len() - 1
        )));
    }

    let captured = re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ExtractionError::FieldNotFound {
            template: template.name.clone(),
            field,
        })?;

    let value = captured.as_str().trim_end_matches(['\r', '\n']);
    trace!("{}: captured {} = {:?}", template.name, field, value);
    Ok(value.to_string())
}

/// Capture all four fields in order (digits, date, amount, merchant),
/// stopping at the first failure.
pub fn extract_fields(text: &str, template: &BankTemplate) -> Result<RawFields> {
    Ok(RawFields {
        last_four_digits: extract_field(text, template, Field::LastFourDigits)?,
        date: extract_field(text, template, Field::Date)?,
        amount: extract_field(text, template, Field::Amount)?,
        merchant: extract_field(text, template, Field::Merchant)?,
    })
}
