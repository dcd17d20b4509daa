//! Human-readable progress and summary output

use colored::Colorize;

use crate::common::ErrorKind;

use super::config::Suite;
use super::runner::RunSummary;
use super::scenario::ScenarioResult;

/// Where progress lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Coloured progress on stdout
    Human,
    /// Nothing on stdout (JSON mode, tests)
    Silent,
}

/// Step lines and warnings for one scenario
pub struct StepLog {
    output: Output,
    warnings: Vec<String>,
}

impl StepLog {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            warnings: Vec::new(),
        }
    }

    /// A step that completed
    pub fn ok(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!("step ok: {}", message);
        if self.output == Output::Human {
            println!("  {} {}", "✓".green(), message);
        }
    }

    /// Informational line with no verdict attached
    pub fn note(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!("{}", message);
        if self.output == Output::Human {
            println!("    {}", message.dimmed());
        }
    }

    /// A soft failure: recorded on the result, does not fail the scenario
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        if self.output == Output::Human {
            println!("  {} {}", "⚠".yellow(), message);
        }
        self.warnings.push(message);
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

pub fn print_suite_header(suite: &Suite) {
    println!("\n{} {}", "Running Suite:".blue().bold(), suite.name.white().bold());
    if let Some(desc) = &suite.description {
        println!("  {}", desc.dimmed());
    }
    println!("{}", "=".repeat(50).dimmed());
}

pub fn print_scenario_start(name: &str) {
    println!("\n{} {}", "Running Test:".cyan(), name.white().bold());
}

pub fn print_scenario_result(result: &ScenarioResult) {
    if result.passed {
        println!("{} {} passed", "✓".green().bold(), result.name.green());
    } else {
        let detail = result.error.as_deref().unwrap_or("unknown error");
        println!("{} {}", "✗".red(), detail);
        println!("{} {} failed", "✗".red().bold(), result.name.red());
    }
}

/// Final tally plus next steps or remediation guidance
pub fn print_summary(summary: &RunSummary, suite: &Suite, backend_url: &str) {
    let tally = format!(
        "Test Results: {}/{} tests passed",
        summary.passed(),
        summary.total()
    );
    println!();
    if summary.success() {
        println!("{}", tally.green().bold());
        println!("{}", "All scenarios passed.".green());
        if !suite.next_steps.is_empty() {
            println!("\n{}", "Next Steps:".cyan());
            for (i, step) in suite.next_steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
        }
        return;
    }

    println!("{}", tally.red().bold());
    for result in summary.results.iter().filter(|r| !r.passed) {
        println!(
            "  {} {}: {}",
            "✗".red(),
            result.name,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("\n{}", "Remediation:".yellow());
    for hint in remediation(&summary.results, backend_url) {
        println!("  - {}", hint);
    }
}

/// Guidance lines for the failure kinds present, in a stable order
pub fn remediation(results: &[ScenarioResult], backend_url: &str) -> Vec<String> {
    let has = |kind: ErrorKind| {
        results
            .iter()
            .any(|r| !r.passed && r.kind == Some(kind))
    };

    let mut hints = Vec::new();
    if has(ErrorKind::Unreachable) {
        hints.push(format!(
            "Make sure the backend is running and reachable at {}",
            backend_url
        ));
    }
    if has(ErrorKind::Timeout) {
        hints.push(
            "The backend accepted the connection but did not answer within the time budget; \
             check its logs for errors while handling recording_started"
                .to_string(),
        );
    }
    if has(ErrorKind::ProtocolViolation) {
        hints.push(
            "The backend answered with an unexpected message; compare its replies with the \
             meeting_created contract"
                .to_string(),
        );
    }
    if has(ErrorKind::PersistenceError) {
        hints.push("Check that DATABASE_URL points at the backend's database and that it is accessible".to_string());
    }
    if has(ErrorKind::PreconditionUnmet) {
        hints.push(
            "Later scenarios depend on Meeting Creation; fix that scenario first".to_string(),
        );
    }
    if has(ErrorKind::Config) || has(ErrorKind::Internal) {
        hints.push("Re-run with --verbose for details".to_string());
    }
    if hints.is_empty() {
        hints.push("Some tests failed. Please check the output above.".to_string());
    }
    hints
}
