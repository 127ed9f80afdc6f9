//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for cardalert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardAlertConfig {
    /// Template registry configuration.
    pub templates: TemplatesConfig,

    /// Plain-text normalizer configuration.
    pub normalizer: NormalizerConfig,
}

/// Where bank templates come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Register the built-in bank templates first.
    pub include_builtin: bool,

    /// Extra JSON template files, registered after the built-ins in order.
    pub files: Vec<PathBuf>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            files: Vec::new(),
        }
    }
}

/// HTML to plain text conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Substring that marks a body as an HTML document (case-sensitive).
    pub html_marker: String,

    /// Largest HTML body that will be converted.
    pub max_markup_bytes: usize,

    /// Deepest element nesting the converter will follow.
    pub max_depth: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            html_marker: "<html".to_string(),
            max_markup_bytes: 2 * 1024 * 1024,
            max_depth: 256,
        }
    }
}

impl CardAlertConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CardAlertConfig =
            serde_json::from_str(r#"{"templates": {"files": ["extra.json"]}}"#).unwrap();

        assert!(config.templates.include_builtin);
        assert_eq!(config.templates.files, vec![PathBuf::from("extra.json")]);
        assert_eq!(config.normalizer.html_marker, "<html");
        assert_eq!(config.normalizer.max_depth, 256);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = CardAlertConfig::default();
        config.templates.include_builtin = false;
        config.normalizer.max_markup_bytes = 1024;
        config.save(&path).unwrap();

        let loaded = CardAlertConfig::from_file(&path).unwrap();
        assert!(!loaded.templates.include_builtin);
        assert_eq!(loaded.normalizer.max_markup_bytes, 1024);
    }

    #[test]
    fn test_invalid_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = CardAlertConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
