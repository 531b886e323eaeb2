//! Cardex command-line interface.
//!
//! Runs the extraction pipeline over saved OCR transcripts (JSON, TSV or plain text).
//! Logs go to stderr so stdout carries only JSON results.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use cardex::core::config::ArchiveConfig;
use cardex::core::extractor::classify_lines;
use cardex::ocr::{TranscriptOcrBackend, decode_transcript};
use cardex::{DocumentPipeline, ExtractionConfig, FieldRecord, validate_record};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardex")]
#[command(about = "Structured field extraction for identity cards and marksheets")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print one JSON document per transcript
    Extract {
        /// Saved OCR transcripts
        #[arg(required = true)]
        transcripts: Vec<PathBuf>,

        /// Configuration file (TOML, YAML or JSON); cardex.toml is discovered otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write every record into a labelled dataset under this directory
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the document type tag of a transcript
    Classify {
        transcript: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a JSON record against its document schema
    Validate {
        record: PathBuf,

        #[arg(long)]
        pretty: bool,
    },
}

fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(ExtractionConfig::discover()
            .context("failed to discover cardex.toml")?
            .unwrap_or_default()),
    }
}

fn to_json(value: &impl serde::Serialize, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

async fn run_extract(
    transcripts: Vec<PathBuf>,
    config: Option<PathBuf>,
    archive_dir: Option<PathBuf>,
    pretty: bool,
) -> Result<ExitCode> {
    let mut config = load_config(config.as_deref())?;
    if let Some(dir) = archive_dir {
        let copy_images = config.archive.as_ref().is_none_or(|a| a.copy_images);
        config.archive = Some(ArchiveConfig { dir, copy_images });
    }

    let pipeline = DocumentPipeline::builder()
        .ocr(Arc::new(TranscriptOcrBackend))
        .config(config)
        .build()?;

    for path in &transcripts {
        let document = pipeline
            .process_file(path)
            .await
            .with_context(|| format!("failed to process {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            document_type = document.document_type.as_str(),
            valid = document.valid,
            "Processed transcript"
        );
        if let Some(error) = &document.validation_error {
            tracing::warn!(path = %path.display(), error = %error, "Record failed validation");
        }
        println!("{}", to_json(&document, pretty)?);
    }

    pipeline.shutdown()?;
    tracing::debug!(count = transcripts.len(), "Extraction finished");
    Ok(ExitCode::SUCCESS)
}

fn run_classify(transcript: &Path, config: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config)?;
    let bytes = std::fs::read(transcript).with_context(|| format!("failed to read {}", transcript.display()))?;
    let stream = decode_transcript(&bytes)?;
    let document_type = classify_lines(&stream, &config);
    tracing::debug!(
        path = %transcript.display(),
        lines = stream.len(),
        document_type = document_type.as_str(),
        "Classified transcript"
    );
    println!("{}", document_type.as_str());
    Ok(ExitCode::SUCCESS)
}

fn run_validate(path: &Path, pretty: bool) -> Result<ExitCode> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let record: FieldRecord =
        serde_json::from_slice(&bytes).with_context(|| format!("{} is not a JSON object", path.display()))?;

    let outcome = validate_record(&record);
    if let Some(error) = &outcome.error {
        tracing::warn!(path = %path.display(), error = %error, "Record failed validation");
    }
    let report = serde_json::json!({
        "document_type": outcome.record.document_type().as_str(),
        "valid": outcome.valid,
        "validation_error": outcome.error,
        "record": outcome.record,
    });
    println!("{}", to_json(&report, pretty)?);

    Ok(if outcome.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    match cli.command {
        Commands::Extract {
            transcripts,
            config,
            archive_dir,
            pretty,
        } => run_extract(transcripts, config, archive_dir, pretty).await,
        Commands::Classify { transcript, config } => run_classify(&transcript, config.as_deref()),
        Commands::Validate { record, pretty } => run_validate(&record, pretty),
    }
}
