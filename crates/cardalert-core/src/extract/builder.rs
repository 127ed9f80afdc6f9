//! Conversion of raw captures into a typed [`Transaction`].

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::fields::RawFields;
use super::Result;
use crate::error::ExtractionError;
use crate::models::transaction::Transaction;

/// Highest value accepted for the card's trailing digits.
const MAX_LAST_FOUR: u16 = 9999;

lazy_static! {
    /// Digits with optional comma thousands groups and up to two decimals.
    static ref AMOUNT_SHAPE: Regex =
        Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?$").unwrap();
}

/// Build a transaction from raw captures.
///
/// Fields are converted in order (digits, date, amount) and the first
/// failure is returned. A date that does not parse is an error; no default
/// date is ever substituted. `message_id` is left empty for the caller.
pub fn build_transaction(raw: &RawFields, date_layout: &str) -> Result<Transaction> {
    let last_four_digits = parse_last_four_digits(&raw.last_four_digits)?;
    let date = parse_date(&raw.date, date_layout)?;
    let amount = parse_amount(&raw.amount)?;

    Ok(Transaction {
        message_id: String::new(),
        last_four_digits,
        date,
        amount,
        merchant: raw.merchant.clone(),
    })
}

/// Parse card digits as a base-10 number no greater than 9999.
///
/// Surrounding whitespace is ignored. Only the merchant is kept verbatim.
pub fn parse_last_four_digits(raw: &str) -> Result<u16> {
    let invalid = || ExtractionError::InvalidDigits {
        raw: raw.to_string(),
    };

    let digits = raw.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    match digits.parse::<u16>() {
        Ok(value) if value <= MAX_LAST_FOUR => Ok(value),
        _ => Err(invalid()),
    }
}

/// Parse a captured date with a chrono `strftime` layout.
///
/// Surrounding whitespace is ignored, so a capture running up to a line
/// break or a padded table cell still parses.
pub fn parse_date(raw: &str, layout: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), layout).map_err(|source| ExtractionError::InvalidDate {
        raw: raw.to_string(),
        layout: layout.to_string(),
        source,
    })
}

/// Parse a captured amount as a non-negative decimal with two decimal places.
///
/// Surrounding whitespace is ignored. Commas are accepted only as thousands
/// separators, and at most two fractional digits are allowed; the value is
/// never rounded. Amounts too large to carry cents are rejected.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let invalid = |reason: &str| ExtractionError::InvalidAmount {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(invalid("amount is negative"));
    }
    if !AMOUNT_SHAPE.is_match(trimmed) {
        return Err(invalid("not a cents amount"));
    }

    let mut amount =
        Decimal::from_str(&trimmed.replace(',', "")).map_err(|e| invalid(&e.to_string()))?;
    amount.rescale(2);
    if amount.scale() != 2 {
        return Err(invalid("amount is too large"));
    }
    Ok(amount)
}
