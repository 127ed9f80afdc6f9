//! Templates for the banks supported out of the box.

use super::BankTemplate;

/// Bank of America "exceeds alert limit" plain-text alert.
pub fn bank_of_america() -> BankTemplate {
    BankTemplate {
        name: "Bank of America".to_string(),
        validation_marker: "Credit card transaction exceeds alert limit you set".to_string(),
        last_four_digits_pattern: r"ending in (\d+)".to_string(),
        amount_pattern: r"Amount: \$(\d+\.\d+)".to_string(),
        merchant_pattern: r"Where: (.*)\n".to_string(),
        date_pattern: r"Date: (.*)\nWhere:".to_string(),
        date_layout: "%B %d, %Y".to_string(),
    }
}

/// Chase "Single Transaction Alert".
pub fn chase() -> BankTemplate {
    BankTemplate {
        name: "Chase".to_string(),
        validation_marker: "Your Single Transaction Alert from Chase".to_string(),
        last_four_digits_pattern: r"ending in (\d+)".to_string(),
        amount_pattern: r"A charge of \(\$USD\) (\d+\.\d+) at .* has been authorized on .* at"
            .to_string(),
        merchant_pattern: r"A charge of \(\$USD\) \d+\.\d+ at (.*) has been authorized on .* at"
            .to_string(),
        date_pattern: r"A charge of \(\$USD\) \d+\.\d+ at .* has been authorized on (.*) at"
            .to_string(),
        date_layout: "%b %d, %Y".to_string(),
    }
}

/// Citi Costco Anywhere HTML alert. Labels and values sit on separate lines
/// once the markup is converted to text.
pub fn citi() -> BankTemplate {
    BankTemplate {
        name: "Citi".to_string(),
        validation_marker: "transaction made on your Costco Anywhere account".to_string(),
        last_four_digits_pattern: r"Card ending in (\d+)".to_string(),
        amount_pattern: r"A \$(\d+\.\d+) transaction was made".to_string(),
        merchant_pattern: r"(?m)Merchant[\r\n\v]+(.*)[\r\n\v]+Date".to_string(),
        date_pattern: r"(?m)Date[\r\n\v]+(\d+/\d+/\d+)[\r\n\v]+Time".to_string(),
        date_layout: "%m/%d/%Y".to_string(),
    }
}

/// All built-in templates in registration order.
pub fn all() -> Vec<BankTemplate> {
    vec![bank_of_america(), chase(), citi()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid() {
        for template in all() {
            let errors = template.validate();
            assert!(errors.is_empty(), "{}: {:?}", template.name, errors);
        }
    }

    #[test]
    fn test_builtin_markers_are_distinct() {
        let templates = all();
        for a in &templates {
            for b in &templates {
                if a.name != b.name {
                    assert!(!a.matches(&b.validation_marker));
                }
            }
        }
    }
}
