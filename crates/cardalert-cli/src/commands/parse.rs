//! Parse command - extract a transaction from a single email file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use cardalert_core::{AlertExtractor, AlertParser, ExtractionError, Transaction};

use crate::source::read_email;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Email file (decoded body, or raw message with --eml / .eml extension)
    #[arg(required = true)]
    input: PathBuf,

    /// Treat the input as a raw RFC 822 message and decode it
    #[arg(long)]
    eml: bool,

    /// Use the HTML part of a raw message when it also has a plain part
    #[arg(long)]
    prefer_html: bool,

    /// Message id to stamp on the record (default: input file stem)
    #[arg(long)]
    message_id: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show which template matched and how long extraction took
    #[arg(long)]
    show_template: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let extractor = AlertExtractor::from_config(&config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let body = read_email(&args.input, args.eml, args.prefer_html)?;
    let result = match extractor.parse(&body) {
        Ok(result) => result,
        Err(e) => {
            report_failure(&args.input.display().to_string(), &e);
            return Err(e.into());
        }
    };

    let message_id = args.message_id.clone().unwrap_or_else(|| message_id_for(&args.input));
    let transaction = result.transaction.with_message_id(message_id);

    let output = format_transaction(&transaction, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_template {
        println!();
        println!("{} Template: {}", style("ℹ").blue(), result.template);
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Log an extraction failure. An unmatched email is logged with its full
/// text so a template can be written for it.
pub fn report_failure(source: &str, error: &ExtractionError) {
    match error {
        ExtractionError::NoMatchingTemplate { text } => {
            warn!(
                "{}: email does not match a template. Mail body below.\n{}",
                source, text
            );
        }
        other => warn!("{}: could not parse mail ({}): {}", source, other.kind(), other),
    }
}

/// Default message id for a file: its stem.
pub fn message_id_for(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Format a transaction in the requested output format.
pub fn format_transaction(transaction: &Transaction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(transaction)?),
        OutputFormat::Csv => format_transactions_csv(std::slice::from_ref(transaction)),
        OutputFormat::Text => Ok(format_transaction_text(transaction)),
    }
}

/// Format transactions as CSV with a header row.
pub fn format_transactions_csv(transactions: &[Transaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for transaction in transactions {
        wtr.serialize(transaction)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(data)?)
}

fn format_transaction_text(transaction: &Transaction) -> String {
    let mut lines = Vec::new();
    if !transaction.message_id.is_empty() {
        lines.push(format!("Message:  {}", transaction.message_id));
    }
    lines.push(format!("Card:     *{:04}", transaction.last_four_digits));
    lines.push(format!("Date:     {}", transaction.canonical_date()));
    lines.push(format!("Amount:   {:.2}", transaction.amount));
    lines.push(format!("Merchant: {}", transaction.merchant));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn transaction() -> Transaction {
        cardalert_core::extract(
            "Your Single Transaction Alert from Chase\nending in 1234\n\
             A charge of ($USD) 109.00 at Test Mer\\chant.com has been authorized on Oct 13, 2020 at 7:06 PM ET.\n",
        )
        .unwrap()
        .with_message_id("abc")
    }

    #[test]
    fn test_format_csv() {
        let csv = format_transaction(&transaction(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "messageID,last_four_digits,date,amount,merchant"
        );
        assert_eq!(lines.next().unwrap(), "abc,1234,2020-10-13,109.00,Test Mer\\chant.com");
    }

    #[test]
    fn test_format_text() {
        let text = format_transaction(&transaction(), OutputFormat::Text).unwrap();
        assert!(text.contains("Card:     *1234"));
        assert!(text.contains("Amount:   109.00"));
    }

    #[test]
    fn test_message_id_for() {
        assert_eq!(message_id_for(Path::new("/mail/hloop9dhu7j61.eml")), "hloop9dhu7j61");
        assert_eq!(message_id_for(Path::new("plain")), "plain");
    }
}
