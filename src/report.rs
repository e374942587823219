//! Human-readable run summary.
use colored::Colorize;

use crate::error::Severity;
use crate::pipeline::{GenerationReport, ModuleStatus};
use crate::validate::ValidationReport;

pub fn print_generation(report: &GenerationReport, verbose: bool) {
    for outcome in &report.modules {
        match &outcome.status {
            ModuleStatus::Failed(error) => {
                eprintln!("{} {}: {error}", "✗".red(), outcome.module);
            }
            ModuleStatus::Written if verbose => {
                eprintln!("{} {} → {}", "✓".green(), outcome.module, outcome.path.display());
            }
            ModuleStatus::Unchanged if verbose => {
                eprintln!("{} {} (unchanged)", "·".dimmed(), outcome.module);
            }
            _ => {}
        }
        if verbose {
            for d in &outcome.diagnostics {
                let tag = match d.severity {
                    Severity::Warning => "warning".yellow(),
                    Severity::Error => "error".red(),
                };
                eprintln!("  {tag}: {}: {} (`{}`)", d.subject, d.message, d.text);
            }
        }
    }
    eprintln!(
        "modules: {} written, {} unchanged, {} failed",
        report.written().to_string().green(),
        report.unchanged(),
        colored_count(report.failed()),
    );
}

pub fn print_validation(report: &ValidationReport, verbose: bool) {
    for file in &report.files {
        if file.passed() {
            continue;
        }
        eprintln!("{} {}", "✗".red(), file.path.display());
        if verbose {
            for d in &file.diagnostics {
                eprintln!("  {}:{}: {:?}: {}", file.path.display(), d.line, d.check, d.message);
                if !d.text.is_empty() {
                    eprintln!("      {}", d.text.dimmed());
                }
            }
        }
    }
    eprintln!(
        "files: {} passed, {} failed",
        report.passed().to_string().green(),
        colored_count(report.failed()),
    );
}

fn colored_count(n: usize) -> colored::ColoredString {
    if n == 0 { n.to_string().normal() } else { n.to_string().red().bold() }
}
