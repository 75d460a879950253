//! Batch processing command for multiple marking photos.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use railtext_core::export::Exporter;
use railtext_core::models::record::ExtractionRecord;
use railtext_core::pipeline::InputKind;
use railtext_core::{ExportFormat, RailTextPipeline};

use super::{EngineArgs, OutputFormat, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for one result file per input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write every record to one table; format follows the extension (.csv, .xlsx, .json, .txt)
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

/// Outcome of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Result<ExtractionRecord, String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.engine.apply(&mut config);

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let format: ExportFormat = args
        .format
        .map(Into::into)
        .unwrap_or(config.export.default_format);
    let summary_format = match &args.summary {
        Some(path) => Some(ExportFormat::from_path(path).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot tell summary format from {}; use .csv, .xlsx, .json or .txt",
                path.display()
            )
        })?),
        None => None,
    };
    if format.is_binary() && args.output_dir.is_none() && args.summary.is_none() {
        anyhow::bail!("{:?} output is binary; use --output-dir or --summary", format);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = RailTextPipeline::from_config(&config)?;
    let exporter = Exporter::new(pipeline.extractor().spec()).with_sheet_name(&config.export.sheet_name);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = pipeline.process_file(&path);
        debug!("Processed {} in {:?}", path.display(), file_start.elapsed());

        match outcome {
            Ok(record) => results.push(ProcessResult {
                path,
                outcome: Ok(record),
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        outcome: Err(error_msg),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    let records: Vec<ExtractionRecord> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok().cloned())
        .collect();
    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();

    // Write per-file outputs
    if let Some(output_dir) = &args.output_dir {
        let mut taken = HashSet::new();
        for result in &results {
            let Ok(record) = &result.outcome else {
                continue;
            };
            let output_path = output_dir.join(output_file_name(&result.path, format, &mut taken));

            exporter.save(std::slice::from_ref(record), format, &output_path)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Write summary table
    if let (Some(summary_path), Some(summary_format)) = (&args.summary, summary_format) {
        exporter.save(&records, summary_format, summary_path)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Nothing written to disk: print all records to stdout
    if args.output_dir.is_none() && args.summary.is_none() {
        let bytes = exporter.write(&records, format)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        if !bytes.ends_with(b"\n") {
            writeln!(stdout)?;
        }
    }

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(records.len()).green(),
        style(failed.len()).red()
    );

    let empty: Vec<_> = records.iter().filter(|r| r.fields.found_count() == 0).collect();
    if !empty.is_empty() {
        eprintln!(
            "   {} with no fields detected: {}",
            style(empty.len()).yellow(),
            empty.iter().map(|r| r.source.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(error) = &result.outcome {
                eprintln!("  - {}: {}", result.path.display(), error);
            }
        }
    }

    Ok(())
}

/// Output name for one input: the full input file name plus the format's
/// extension (`plate.png` -> `plate.png.json`), numbered when two inputs
/// from different directories share a name.
fn output_file_name(input: &Path, format: ExportFormat, taken: &mut HashSet<String>) -> String {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "marking".to_string());

    let mut name = format!("{}.{}", base, format.extension());
    let mut n = 2;
    while !taken.insert(name.to_lowercase()) {
        name = format!("{}-{}.{}", base, n, format.extension());
        n += 1;
    }
    name
}
