//! Ordered, read-only-after-startup set of bank templates.

use std::path::Path;

use lazy_static::lazy_static;
use tracing::{debug, info};

use super::{builtin, BankTemplate};
use crate::error::TemplateError;
use crate::models::config::TemplatesConfig;

lazy_static! {
    static ref BUILTIN_REGISTRY: TemplateRegistry = TemplateRegistry::builtin();
}

/// Process-wide registry seeded with the built-in templates.
pub fn builtin_registry() -> &'static TemplateRegistry {
    &BUILTIN_REGISTRY
}

/// Registered templates, kept in registration order.
///
/// Order matters: when several markers match one email, the template
/// registered last wins.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<BankTemplate>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in templates.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for template in builtin::all() {
            registry.register(template);
        }
        registry
    }

    /// Build a registry from configuration: built-ins first (if enabled),
    /// then each template file in order.
    pub fn from_config(config: &TemplatesConfig) -> Result<Self, TemplateError> {
        let mut registry = if config.include_builtin {
            Self::builtin()
        } else {
            Self::new()
        };

        for path in &config.files {
            registry.load_file(path)?;
        }

        info!("Template registry ready with {} templates", registry.len());
        Ok(registry)
    }

    /// Append a template.
    pub fn register(&mut self, template: BankTemplate) {
        debug!("Registering template {}", template.name);
        self.templates.push(template);
    }

    /// Register every template in a JSON file holding an array of templates.
    /// Returns how many were added.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let templates: Vec<BankTemplate> =
            serde_json::from_str(&content).map_err(|source| TemplateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let count = templates.len();
        for template in templates {
            self.register(template);
        }
        debug!("Loaded {} templates from {}", count, path.display());
        Ok(count)
    }

    /// All templates in registration order.
    pub fn all(&self) -> &[BankTemplate] {
        &self.templates
    }

    /// Look up a template by name. If a name was registered twice, the later
    /// registration is returned.
    pub fn get(&self, name: &str) -> Option<&BankTemplate> {
        self.templates.iter().rev().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Validate every template, returning all defects found.
    pub fn validate(&self) -> Vec<TemplateError> {
        self.templates.iter().flat_map(|t| t.validate()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, marker: &str) -> BankTemplate {
        BankTemplate {
            name: name.to_string(),
            validation_marker: marker.to_string(),
            ..builtin::bank_of_america()
        }
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = TemplateRegistry::new();
        registry.register(named("first", "one"));
        registry.register(named("second", "two"));
        registry.register(named("third", "three"));

        let names: Vec<&str> = registry.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("Chase").is_some());
        assert!(registry.get("Wells Fargo").is_none());
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_get_prefers_later_registration() {
        let mut registry = TemplateRegistry::new();
        registry.register(named("dup", "old marker"));
        registry.register(named("dup", "new marker"));

        assert_eq!(registry.get("dup").unwrap().validation_marker, "new marker");
    }

    #[test]
    fn test_from_config_appends_files_after_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.json");
        let extra = vec![named("Extra Bank", "Extra Bank alert")];
        std::fs::write(&path, serde_json::to_string(&extra).unwrap()).unwrap();

        let config = TemplatesConfig {
            include_builtin: true,
            files: vec![path],
        };
        let registry = TemplateRegistry::from_config(&config).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.all()[3].name, "Extra Bank");
    }

    #[test]
    fn test_from_config_without_builtins() {
        let config = TemplatesConfig {
            include_builtin: false,
            files: Vec::new(),
        };
        assert!(TemplateRegistry::from_config(&config).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let mut registry = TemplateRegistry::new();
        let err = registry
            .load_file(Path::new("/nonexistent/templates.json"))
            .unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"name": "missing fields"}]"#).unwrap();

        let mut registry = TemplateRegistry::new();
        let err = registry.load_file(&path).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
        assert!(registry.is_empty());
    }
}
