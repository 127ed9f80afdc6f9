//! The end-to-end extraction entry point.

use std::time::Instant;

use tracing::info;

use super::builder::build_transaction;
use super::fields::extract_fields;
use super::normalize::Normalizer;
use super::select::select_template;
use super::{AlertParser, ExtractionResult, Result};
use crate::models::config::CardAlertConfig;
use crate::models::transaction::Transaction;
use crate::template::{builtin_registry, TemplateRegistry};

/// Turns alert email bodies into transactions.
///
/// Holds only read-only state, so one instance can be shared across threads
/// (for example behind an `Arc`) and called concurrently.
#[derive(Debug, Clone)]
pub struct AlertExtractor {
    registry: TemplateRegistry,
    normalizer: Normalizer,
}

impl AlertExtractor {
    /// Create an extractor over `registry` with the default normalizer.
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry,
            normalizer: Normalizer::new(),
        }
    }

    /// Build the registry and normalizer described by `config`.
    pub fn from_config(config: &CardAlertConfig) -> crate::Result<Self> {
        let registry = TemplateRegistry::from_config(&config.templates)?;
        Ok(Self::new(registry).with_normalizer(Normalizer::from_config(&config.normalizer)))
    }

    /// Replace the normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Extract a transaction from an email body. The returned transaction
    /// has an empty `message_id`.
    pub fn extract(&self, text: &str) -> Result<Transaction> {
        self.parse(text).map(|r| r.transaction)
    }
}

impl Default for AlertExtractor {
    fn default() -> Self {
        Self::new(builtin_registry().clone())
    }
}

impl AlertParser for AlertExtractor {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        let normalized = self.normalizer.normalize(text)?;
        let template = select_template(&normalized, self.registry.all())?;
        let fields = extract_fields(&normalized, template)?;
        let transaction = build_transaction(&fields, &template.date_layout)?;

        info!(
            "Extracted {} transaction for card *{:04}",
            template.name, transaction.last_four_digits
        );

        Ok(ExtractionResult {
            transaction,
            template: template.name.clone(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Extract a transaction using the built-in templates.
pub fn extract(text: &str) -> Result<Transaction> {
    let normalized = Normalizer::new().normalize(text)?;
    let template = select_template(&normalized, builtin_registry().all())?;
    let fields = extract_fields(&normalized, template)?;
    build_transaction(&fields, &template.date_layout)
}
