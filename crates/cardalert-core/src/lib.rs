//! Core library for credit card alert email processing.
//!
//! This crate provides:
//! - Bank alert templates and an ordered template registry
//! - HTML to plain text normalization of email bodies
//! - Template selection by validation marker
//! - Field capture and conversion into a canonical [`Transaction`]

pub mod error;
pub mod extract;
pub mod models;
pub mod template;

pub use error::{CardAlertError, ErrorKind, ExtractionError, Result, TemplateError};
pub use extract::{extract, AlertExtractor, AlertParser, ExtractionResult, Normalizer};
pub use models::{CardAlertConfig, Field, Transaction};
pub use template::{builtin_registry, BankTemplate, TemplateRegistry};
