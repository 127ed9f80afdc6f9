//! Template selection by validation marker.

use tracing::{debug, warn};

use super::Result;
use crate::error::ExtractionError;
use crate::template::BankTemplate;

/// Pick the template for `text`.
///
/// Templates are scanned in registration order and the last one whose marker
/// appears in the text wins, so a later registration overrides an earlier
/// one. Fails with [`ExtractionError::NoMatchingTemplate`] carrying the text
/// when nothing matches.
pub fn select_template<'r>(text: &str, templates: &'r [BankTemplate]) -> Result<&'r BankTemplate> {
    let mut selected: Option<&BankTemplate> = None;

    for template in templates.iter().filter(|t| t.matches(text)) {
        if let Some(previous) = selected {
            warn!(
                "Email matches templates {} and {}; using {}",
                previous.name, template.name, template.name
            );
        }
        selected = Some(template);
    }

    match selected {
        Some(template) => {
            debug!("Selected template {}", template.name);
            Ok(template)
        }
        None => Err(ExtractionError::NoMatchingTemplate {
            text: text.to_string(),
        }),
    }
}

/// Every template whose marker appears in `text`, in registration order.
pub fn matching_templates<'r>(text: &str, templates: &'r [BankTemplate]) -> Vec<&'r BankTemplate> {
    templates.iter().filter(|t| t.matches(text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::builtin;

    fn with_marker(name: &str, marker: &str) -> BankTemplate {
        BankTemplate {
            name: name.to_string(),
            validation_marker: marker.to_string(),
            ..builtin::chase()
        }
    }

    #[test]
    fn test_selects_each_builtin_on_its_own_marker() {
        let templates = builtin::all();
        for template in &templates {
            let text = format!("Hello,\n{}\nThanks", template.validation_marker);
            let selected = select_template(&text, &templates).unwrap();
            assert_eq!(selected.name, template.name);
        }
    }

    #[test]
    fn test_later_registration_wins() {
        let templates = vec![
            with_marker("generic", "Transaction Alert"),
            with_marker("specific", "Single Transaction Alert"),
        ];
        let text = "Your Single Transaction Alert from Example Bank";

        assert_eq!(select_template(text, &templates).unwrap().name, "specific");

        let reversed: Vec<BankTemplate> = templates.into_iter().rev().collect();
        assert_eq!(select_template(text, &reversed).unwrap().name, "generic");
    }

    #[test]
    fn test_no_match_carries_text() {
        let templates = builtin::all();
        let err = select_template("just a newsletter", &templates).unwrap_err();
        match err {
            ExtractionError::NoMatchingTemplate { text } => assert_eq!(text, "just a newsletter"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_registry_never_matches() {
        assert!(select_template("anything", &[]).is_err());
    }

    #[test]
    fn test_matching_templates() {
        let templates = vec![
            with_marker("a", "alpha"),
            with_marker("b", "beta"),
            with_marker("c", "gamma"),
        ];
        let names: Vec<&str> = matching_templates("gamma and alpha", &templates)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
