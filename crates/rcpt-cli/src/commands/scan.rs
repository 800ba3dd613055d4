//! Scan command - extract receipt fields from an image or PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use rcpt_core::error::OcrError;
use rcpt_core::models::config::RcptConfig;
use rcpt_core::{
    create_engine_from_dir, ExtractionResult, MediaType, OcrEngine, OcrResult, PureOcrEngine,
    RcptError, ReceiptScanner, ReceiptStore, ScanOutcome, Upload,
};

use super::{open_store, OutputFormat};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Receipt file (PNG, JPEG or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Save the receipt after extraction
    #[arg(long)]
    save: bool,

    /// Receipt database (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Print the raw OCR text
    #[arg(long)]
    show_text: bool,
}

/// OCR engine for the CLI: the native engine, or a stand-in that reports why
/// it could not be loaded. A PDF with a text layer still scans without models.
enum CliEngine {
    Native(PureOcrEngine),
    Unavailable(String),
}

impl OcrEngine for CliEngine {
    fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        match self {
            Self::Native(engine) => engine.process(image),
            Self::Unavailable(reason) => Err(OcrError::ModelLoad(reason.clone())),
        }
    }
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    if MediaType::from_path(&args.input).is_none() {
        let extension = args
            .input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Scanning file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );

    pb.set_message("Reading file...");
    let upload = Upload::from_path(&args.input)?;

    pb.set_message("Loading OCR models...");
    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| config.models.model_dir.clone());
    let engine = load_engine(&model_dir, &config);

    pb.set_message("Running OCR...");
    let scanner = ReceiptScanner::new(engine, &config);
    let outcome = scanner.scan(&upload);
    pb.finish_and_clear();

    let result = match outcome {
        ScanOutcome::Extracted(result) => result,
        ScanOutcome::Failed { reason } => {
            anyhow::bail!("Extraction failed for {}: {}", args.input.display(), reason)
        }
    };

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let output = format_result(&result, args.format, args.show_text)?;
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

    if args.save {
        save_receipt(&result, args.db.as_deref(), &config)?;
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn load_engine(model_dir: &Path, config: &RcptConfig) -> CliEngine {
    match create_engine_from_dir(model_dir, &config.models, config.ocr.clone()) {
        Ok(engine) => CliEngine::Native(engine),
        Err(e) => {
            warn!("OCR engine unavailable: {}", e);
            CliEngine::Unavailable(format!("{} (use --model-dir to point at the OCR models)", e))
        }
    }
}

fn save_receipt(
    result: &ExtractionResult,
    db: Option<&Path>,
    config: &RcptConfig,
) -> anyhow::Result<()> {
    let validated = result
        .record
        .validate()
        .map_err(RcptError::from)
        .context("Receipt not saved")?;

    let store = open_store(db, config)?;
    let stored = store.insert(&validated)?;

    println!(
        "{} Saved receipt #{} ({} {} at {})",
        style("✓").green(),
        stored.id,
        stored.amount,
        stored.currency,
        stored.vendor
    );

    Ok(())
}

fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    show_text: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result, show_text)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let record = &result.record;
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "vendor",
        "transaction_date",
        "amount",
        "currency",
        "category",
        "language",
    ])?;

    wtr.write_record([
        record.vendor.clone(),
        record
            .transaction_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.amount.to_string(),
        record.currency.clone(),
        record.category.clone(),
        record.language.clone().unwrap_or_default(),
    ])?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &ExtractionResult, show_text: bool) -> String {
    let record = &result.record;
    let mut output = String::new();

    output.push_str(&format!("Vendor:   {}\n", record.vendor));
    output.push_str(&format!(
        "Date:     {}\n",
        record
            .transaction_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("Amount:   {} {}\n", record.amount, record.currency));
    output.push_str(&format!("Category: {}\n", record.category));
    if let Some(language) = &record.language {
        output.push_str(&format!("Language: {}\n", language));
    }
    output.push_str(&format!("Source:   {:?}", result.source_type));

    if show_text {
        output.push_str("\n\nExtracted text:\n");
        output.push_str(&record.raw_text);
    }

    output
}
