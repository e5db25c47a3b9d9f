//! CLI tool for converting a folder of survey decks into a CSV table.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use survey_core::SurveyOptions;

/// Convert survey slide decks into one CSV row per respondent, saving one
/// picture per outcome slide.
#[derive(Parser, Debug)]
#[command(name = "survey-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the .pptx decks
    #[arg(default_value = "powerpointdata")]
    input_dir: PathBuf,

    /// Directory for extracted images
    #[arg(short, long, default_value = "images")]
    images: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "powerpoint_data.csv")]
    output: PathBuf,

    /// Group id to skip (repeatable)
    #[arg(short, long = "skip-group", default_values_t = vec!["04".to_string(), "06".to_string()])]
    skip_group: Vec<String>,

    /// Id given to the first respondent
    #[arg(long, default_value = "0")]
    start_id: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let options = SurveyOptions::new(&args.images).with_skip_groups(args.skip_group.iter().cloned());

    let batch = survey_pptx::process_directory(&args.input_dir, &options, args.start_id)
        .with_context(|| format!("Failed to process {}", args.input_dir.display()))?;

    survey_core::write_csv_file(&args.output, &batch.records)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if args.verbose {
        eprintln!(
            "{} respondents written to {}, next id {}",
            batch.records.len(),
            args.output.display(),
            batch.next_id
        );
    }

    Ok(())
}
