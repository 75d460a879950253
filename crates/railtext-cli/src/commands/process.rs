//! Process command - extract rail marking fields from a single file.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use railtext_core::export::Exporter;
use railtext_core::models::record::ExtractionRecord;
use railtext_core::pipeline::InputKind;
use railtext_core::{ExportFormat, RailTextPipeline};

use super::{EngineArgs, OutputFormat, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image, or .txt with already recognized text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Write the image handed to OCR to this path
    #[arg(long)]
    save_preprocessed: Option<PathBuf>,

    /// Print the recognized text to stderr
    #[arg(long)]
    show_text: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.engine.apply(&mut config);

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let Some(kind) = InputKind::from_path(&args.input) else {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    };

    let format: ExportFormat = args
        .format
        .map(Into::into)
        .unwrap_or(config.export.default_format);
    if format.is_binary() && args.output.is_none() {
        anyhow::bail!("{:?} output is binary; use --output to choose a file", format);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    let pipeline = RailTextPipeline::from_config(&config)?;
    debug!("Using OCR engine: {}", pipeline.engine_name());

    let record = match kind {
        InputKind::Text => {
            pb.set_message("Extracting fields...");
            pipeline.process_file(&args.input)?
        }
        InputKind::Image => process_image(&args, &pipeline, &pb)?,
    };

    pb.finish_and_clear();

    if args.show_text {
        eprintln!("{}", style("Recognized text:").cyan());
        eprintln!("{}", record.raw_text);
        eprintln!();
    }

    let exporter = Exporter::new(pipeline.extractor().spec()).with_sheet_name(&config.export.sheet_name);

    if let Some(output_path) = &args.output {
        exporter.save(std::slice::from_ref(&record), format, output_path)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        let bytes = exporter.write(std::slice::from_ref(&record), format)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        if !bytes.ends_with(b"\n") {
            writeln!(stdout)?;
        }
    }

    report_missing(&record);

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn process_image(
    args: &ProcessArgs,
    pipeline: &RailTextPipeline,
    pb: &ProgressBar,
) -> anyhow::Result<ExtractionRecord> {
    pb.set_message("Loading image...");
    let image = image::open(&args.input)?;
    let source = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());

    let Some(path) = &args.save_preprocessed else {
        pb.set_message(format!("Running OCR ({})...", pipeline.engine_name()));
        return Ok(pipeline.process_image(&image, &source)?);
    };

    pb.set_message("Preprocessing...");
    let prepared = pipeline.prepare(&image);
    prepared.save(path)?;
    debug!("Saved preprocessed image to {}", path.display());

    pb.set_message(format!("Running OCR ({})...", pipeline.engine_name()));
    Ok(pipeline.process_prepared(&prepared, &source)?)
}

/// Tell the user when fields need to be filled in by hand.
fn report_missing(record: &ExtractionRecord) {
    let fields = &record.fields;
    if fields.found_count() == 0 {
        eprintln!(
            "{} No fields detected in {}. Fill them in manually.",
            style("⚠").yellow(),
            record.source
        );
    } else if fields.found_count() < fields.len() {
        eprintln!(
            "{} {}/{} fields found; missing: {}",
            style("ℹ").blue(),
            fields.found_count(),
            fields.len(),
            fields.missing().collect::<Vec<_>>().join(", ")
        );
    }
}
