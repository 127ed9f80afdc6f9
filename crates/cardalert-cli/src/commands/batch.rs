//! Batch processing command for multiple email files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, error};

use cardalert_core::{AlertExtractor, AlertParser, ErrorKind, ExtractionError, Transaction};

use super::parse::{format_transaction, format_transactions_csv, message_id_for, report_failure, OutputFormat};
use crate::source::read_email;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (one file per email)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Use the HTML part of raw messages when they also have a plain part
    #[arg(long)]
    prefer_html: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    template: Option<String>,
    transaction: Option<Transaction>,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let extractor = Arc::new(AlertExtractor::from_config(&config)?);

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} emails")?
            .progress_chars("=>-"),
    );

    // Workers finish in any order; results are handed on in input order and
    // never past the first failure.
    let jobs = args.jobs.max(1);
    let mut workers = JoinSet::new();
    let mut next = 0;
    let mut pending: BTreeMap<usize, ProcessResult> = BTreeMap::new();
    let mut results: Vec<ProcessResult> = Vec::with_capacity(files.len());
    let mut first_failure: Option<usize> = None;

    loop {
        while first_failure.is_none() && next < files.len() && workers.len() < jobs {
            let index = next;
            let path = files[index].clone();
            let extractor = Arc::clone(&extractor);
            let prefer_html = args.prefer_html;
            workers.spawn_blocking(move || (index, process_single_file(&path, &extractor, prefer_html)));
            next += 1;
        }

        let Some(joined) = workers.join_next().await else {
            break;
        };
        let (index, result) = joined?;
        overall_pb.inc(1);

        if result.error.is_some() && !args.continue_on_error {
            first_failure = Some(first_failure.map_or(index, |f| f.min(index)));
        }
        pending.insert(index, result);

        while first_failure.is_none_or(|f| results.len() < f) {
            let Some(result) = pending.remove(&results.len()) else {
                break;
            };
            if let Some(ref output_dir) = args.output_dir {
                write_output(output_dir, &result, args.format)?;
            }
            results.push(result);
        }
    }

    if let Some(index) = first_failure {
        overall_pb.abandon();
        let failed = pending.get(&index);
        let path = files[index].display();
        let reason = failed.and_then(|r| r.error.clone()).unwrap_or_default();
        error!("Failed to process {}: {}", path, reason);
        anyhow::bail!("Processing failed for {}: {}", path, reason);
    }

    overall_pb.finish_with_message("Complete");

    if args.output_dir.is_none() {
        let transactions: Vec<Transaction> =
            results.iter().filter_map(|r| r.transaction.clone()).collect();
        match args.format {
            OutputFormat::Csv => print!("{}", format_transactions_csv(&transactions)?),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transactions)?),
            OutputFormat::Text => {
                for transaction in &transactions {
                    println!("{}", format_transaction(transaction, OutputFormat::Text)?);
                    println!();
                }
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    println!();
    println!(
        "{} Processed {} emails in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    if failed > 0 {
        println!(
            "{} {} emails could not be parsed",
            style("⚠").yellow(),
            failed
        );
    }

    Ok(())
}

fn process_single_file(path: &Path, extractor: &AlertExtractor, prefer_html: bool) -> ProcessResult {
    let file_start = Instant::now();
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        template: None,
        transaction: None,
        error: None,
        error_kind: None,
        processing_time_ms: 0,
    };

    match read_email(path, false, prefer_html) {
        Ok(body) => match extractor.parse(&body) {
            Ok(extracted) => {
                result.template = Some(extracted.template);
                result.transaction =
                    Some(extracted.transaction.with_message_id(message_id_for(path)));
            }
            Err(e) => record_extraction_error(&mut result, &e),
        },
        Err(e) => result.error = Some(format!("{:#}", e)),
    }

    result.processing_time_ms = file_start.elapsed().as_millis() as u64;
    result
}

fn write_output(output_dir: &Path, result: &ProcessResult, format: OutputFormat) -> anyhow::Result<()> {
    let Some(transaction) = &result.transaction else {
        return Ok(());
    };

    let output_path = output_dir.join(format!(
        "{}.{}",
        message_id_for(&result.path),
        format.extension()
    ));
    fs::write(&output_path, format_transaction(transaction, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn record_extraction_error(result: &mut ProcessResult, error: &ExtractionError) {
    report_failure(&result.path.display().to_string(), error);
    result.error = Some(error.to_string());
    result.error_kind = Some(error.kind());
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "status",
        "template",
        "last_four_digits",
        "date",
        "amount",
        "amount_cents",
        "merchant",
        "error_kind",
        "error",
        "processing_time_ms",
    ])?;

    for result in results {
        let status = if result.transaction.is_some() { "ok" } else { "failed" };
        let (digits, date, amount, cents, merchant) = match &result.transaction {
            Some(tx) => (
                tx.last_four_digits.to_string(),
                tx.canonical_date(),
                format!("{:.2}", tx.amount),
                tx.amount_cents().map(|c| c.to_string()).unwrap_or_default(),
                tx.merchant.clone(),
            ),
            None => Default::default(),
        };

        wtr.write_record([
            result.path.display().to_string(),
            status.to_string(),
            result.template.clone().unwrap_or_default(),
            digits,
            date,
            amount,
            cents,
            merchant,
            result.error_kind.map(|k| k.to_string()).unwrap_or_default(),
            result.error.clone().unwrap_or_default(),
            result.processing_time_ms.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
