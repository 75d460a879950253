//! Fields command - show the field table used for extraction.

use clap::Args;
use console::style;

use railtext_core::CaptureMode;

use super::load_config;

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// Print the rules as JSON
    #[arg(long)]
    json: bool,

    /// Also show the generated regular expressions
    #[arg(long)]
    patterns: bool,
}

pub async fn run(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let spec = config.extraction.field_spec()?;

    if args.json {
        let rules: Vec<_> = spec.fields().iter().map(|f| f.rule()).collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("{}", style(format!("{} fields:", spec.len())).bold());
    for field in spec.fields() {
        let rule = field.rule();
        let capture = match &rule.capture {
            CaptureMode::Token => "token".to_string(),
            CaptureMode::UntilLabel { terminator } => format!("until {}", terminator),
        };
        println!(
            "  {:<12} label {:<16} {}",
            style(field.name()).cyan(),
            format!("\"{}\"", rule.label),
            capture
        );
        if args.patterns {
            println!("  {:<12} {}", "", style(field.pattern()).dim());
        }
    }

    Ok(())
}
