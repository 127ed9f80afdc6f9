//! Templates command - inspect and validate the template registry.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use cardalert_core::extract::matching_templates;
use cardalert_core::{AlertExtractor, Normalizer, TemplateRegistry};

use crate::source::read_email;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List registered templates in registration order
    List,

    /// Show one template as JSON
    Show {
        /// Template name
        name: String,
    },

    /// Validate every registered template
    Check,

    /// Show which templates' markers appear in an email
    Match {
        /// Email file
        input: PathBuf,

        /// Treat the input as a raw RFC 822 message and decode it
        #[arg(long)]
        eml: bool,
    },
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let registry = TemplateRegistry::from_config(&config.templates)?;

    match args.command {
        TemplatesCommand::List => list_templates(&registry),
        TemplatesCommand::Show { name } => show_template(&registry, &name),
        TemplatesCommand::Check => check_templates(&registry),
        TemplatesCommand::Match { input, eml } => {
            let extractor = AlertExtractor::new(registry)
                .with_normalizer(Normalizer::from_config(&config.normalizer));
            match_templates(&extractor, &input, eml)
        }
    }
}

fn list_templates(registry: &TemplateRegistry) -> anyhow::Result<()> {
    if registry.is_empty() {
        println!("{} No templates registered.", style("ℹ").blue());
        return Ok(());
    }

    for (index, template) in registry.all().iter().enumerate() {
        println!(
            "{:>2}. {}  {}",
            index + 1,
            style(&template.name).bold(),
            style(format!("{:?}", template.validation_marker)).dim()
        );
    }
    Ok(())
}

fn show_template(registry: &TemplateRegistry, name: &str) -> anyhow::Result<()> {
    let template = registry
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Template not found: {}", name))?;
    println!("{}", serde_json::to_string_pretty(template)?);
    Ok(())
}

fn check_templates(registry: &TemplateRegistry) -> anyhow::Result<()> {
    let errors = registry.validate();
    if errors.is_empty() {
        println!(
            "{} {} templates are valid",
            style("✓").green(),
            registry.len()
        );
        return Ok(());
    }

    for error in &errors {
        eprintln!("  - {}", error);
    }
    anyhow::bail!("{} template problems found", errors.len())
}

fn match_templates(extractor: &AlertExtractor, input: &Path, eml: bool) -> anyhow::Result<()> {
    let body = read_email(input, eml, false)?;
    let text = extractor.normalizer().normalize(&body)?;
    let matches = matching_templates(&text, extractor.registry().all());

    if matches.is_empty() {
        println!("{} No template matches this email.", style("⚠").yellow());
        return Ok(());
    }

    let selected = matches.len() - 1;
    for (index, template) in matches.iter().enumerate() {
        if index == selected {
            println!("{} {} (selected)", style("✓").green(), template.name);
        } else {
            println!("  {} (overridden)", template.name);
        }
    }
    Ok(())
}
