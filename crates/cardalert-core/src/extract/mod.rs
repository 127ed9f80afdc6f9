//! Alert email to transaction extraction.
//!
//! The pipeline runs normalize -> select template -> extract fields -> build
//! transaction. Each stage is a plain function over values returned by the
//! previous one, so there is no shared state between calls.

pub mod builder;
pub mod fields;
pub mod normalize;
mod pipeline;
pub mod select;

pub use builder::build_transaction;
pub use fields::{extract_field, extract_fields, RawFields};
pub use normalize::{normalize, Normalizer};
pub use pipeline::{extract, AlertExtractor};
pub use select::{matching_templates, select_template};

use serde::Serialize;

use crate::error::ExtractionError;
use crate::models::transaction::Transaction;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// The extracted transaction, `message_id` unset.
    pub transaction: Transaction,
    /// Name of the template that matched.
    pub template: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for alert email parsing.
pub trait AlertParser {
    /// Parse a transaction from an email body.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}
