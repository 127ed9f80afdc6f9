//! Data models for transactions and configuration.

pub mod config;
pub mod transaction;

pub use config::{CardAlertConfig, NormalizerConfig, TemplatesConfig};
pub use transaction::{Field, Transaction, CANONICAL_DATE_FORMAT};
