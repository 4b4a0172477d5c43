//! Output formatting utilities

use aptgen_host::BuildRecord;
use colored::*;

use crate::error::CliResult;

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One-line human-readable summary
    #[default]
    Text,
    /// The build record as JSON
    Json,
}

/// Print the summary of one run in the specified format
pub fn print_record(record: &BuildRecord, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => print_summary(record),
    }
    Ok(())
}

fn print_summary(record: &BuildRecord) {
    if !record.success {
        print_error(&format!(
            "Annotation processing failed for {} file(s)",
            record.files
        ));
        return;
    }
    if record.files == 0 {
        print_info("Nothing to process");
        return;
    }

    let roots = record
        .source_roots
        .iter()
        .chain(record.test_source_roots.iter())
        .map(|root| root.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if roots.is_empty() {
        print_success(&format!("Processed {} file(s)", record.files));
    } else {
        print_success(&format!(
            "Processed {} file(s); generated sources in {roots}",
            record.files
        ));
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
