//! Fetch command - retrieve a stored message by id and extract it.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use cardalert_core::AlertExtractor;

use super::parse::{format_transaction, report_failure, OutputFormat};
use crate::source::{DirectorySource, MessageSource};

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Directory holding raw messages named by message id
    #[arg(required = true)]
    mail_dir: PathBuf,

    /// Id of the message to process
    #[arg(required = true)]
    message_id: String,

    /// Use the HTML part when the message also has a plain part
    #[arg(long)]
    prefer_html: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: FetchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let extractor = AlertExtractor::from_config(&config)?;
    let source = DirectorySource::new(&args.mail_dir).with_prefer_html(args.prefer_html);

    info!("Fetching message {}", args.message_id);
    let body = source.fetch(&args.message_id)?;

    let transaction = match extractor.extract(&body) {
        Ok(transaction) => transaction.with_message_id(args.message_id.as_str()),
        Err(e) => {
            report_failure(&args.message_id, &e);
            return Err(e.into());
        }
    };

    println!("{}", format_transaction(&transaction, args.format)?);
    Ok(())
}
