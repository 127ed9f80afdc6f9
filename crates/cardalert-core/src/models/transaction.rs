//! Canonical card transaction record.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Output format for [`Transaction::canonical_date`].
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// A card transaction extracted from one alert email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identity of the source message. Empty until the caller stamps it.
    #[serde(rename = "messageID", default)]
    pub message_id: String,

    /// Trailing digits of the card number as printed in the alert.
    pub last_four_digits: u16,

    /// Transaction date (serialized as `YYYY-MM-DD`).
    pub date: NaiveDate,

    /// Charged amount, always non-negative, two decimal places.
    pub amount: Decimal,

    /// Merchant exactly as captured, minus trailing line breaks.
    pub merchant: String,
}

impl Transaction {
    /// Attach the identity of the message this record came from.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Date in `YYYY-MM-DD` form.
    pub fn canonical_date(&self) -> String {
        self.date.format(CANONICAL_DATE_FORMAT).to_string()
    }

    /// Amount in minor units (cents), or `None` when it does not fit an `i64`.
    pub fn amount_cents(&self) -> Option<i64> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} card *{:04} {:.2} at {}",
            self.canonical_date(),
            self.last_four_digits,
            self.amount,
            self.merchant
        )
    }
}

/// The four fields a template extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LastFourDigits,
    Date,
    Amount,
    Merchant,
}

impl Field {
    /// Fields in extraction order. Failures are reported for the first
    /// field in this order that fails.
    pub const ALL: [Field; 4] = [
        Field::LastFourDigits,
        Field::Date,
        Field::Amount,
        Field::Merchant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::LastFourDigits => "last four digits",
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Merchant => "merchant",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
