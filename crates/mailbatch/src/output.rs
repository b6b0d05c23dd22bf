//! Console rendering of runs and summaries.

use std::time::Duration;

use mailbatch_api::Letter;
use mailbatch_core::{Chunk, LetterSummary, Outcome, PasswordChangeSummary, Progress, RunObserver, RunReport};

/// Prints one line per outcome as results arrive.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    /// Creates an observer. `verbose` also prints chunk and pacing lines.
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn chunk(&self, chunk: &Chunk<'_>, chunk_count: usize) {
        if self.verbose {
            println!(
                "-- chunk {}/{} ({} accounts)",
                chunk.index + 1,
                chunk_count,
                chunk.records.len()
            );
        }
    }

    fn wait(&self, wait: Duration) {
        if self.verbose {
            println!("-- waiting {} ms", wait.as_millis());
        }
    }
}

/// Formats one outcome line: `[n/total] ✓ email: message`.
#[must_use]
pub fn outcome_line<T>(progress: Progress, outcome: &Outcome<T>) -> String {
    let mark = if outcome.is_success() { '✓' } else { '✗' };
    format!(
        "[{}/{}] {mark} {}: {}",
        progress.completed, progress.total, outcome.email, outcome.message
    )
}

/// Formats the provider's request quota.
#[must_use]
pub fn rate_limit_line(rate_limit: Option<u32>) -> String {
    rate_limit.map_or_else(
        || "Rate limit: not reported".to_string(),
        |limit| format!("Rate limit: {limit} req/s"),
    )
}

impl RunObserver<()> for ConsoleObserver {
    fn chunk_started(&mut self, chunk: &Chunk<'_>, chunk_count: usize) {
        self.chunk(chunk, chunk_count);
    }

    fn outcome(&mut self, progress: Progress, outcome: &Outcome<()>) {
        println!("{}", outcome_line(progress, outcome));
    }

    fn pacing(&mut self, wait: Duration) {
        self.wait(wait);
    }
}

impl RunObserver<Vec<Letter>> for ConsoleObserver {
    fn chunk_started(&mut self, chunk: &Chunk<'_>, chunk_count: usize) {
        self.chunk(chunk, chunk_count);
    }

    fn outcome(&mut self, progress: Progress, outcome: &Outcome<Vec<Letter>>) {
        println!("{}", outcome_line(progress, outcome));
    }

    fn pacing(&mut self, wait: Duration) {
        self.wait(wait);
    }
}

fn print_interruption<T>(report: &RunReport<T>) {
    if report.interrupted {
        println!("Interrupted: {} accounts not processed", report.pending);
    }
}

fn print_failure_breakdown<T>(report: &RunReport<T>) {
    for (kind, count) in report.failure_counts() {
        println!("  {:<20}{count}", kind.label());
    }
}

/// Prints the password change summary.
pub fn print_password_summary(summary: &PasswordChangeSummary) {
    let report = &summary.report;
    println!();
    println!("Password change finished");
    println!("  Successful: {}", report.succeeded);
    println!("  Failed:     {}", report.failed);
    println!("  Total:      {}", report.total);
    if summary.skipped_lines > 0 {
        println!("  Skipped lines: {}", summary.skipped_lines);
    }
    print_failure_breakdown(report);
    print_interruption(report);

    if let Some(path) = &summary.results_path {
        println!("Updated accounts saved to {}", path.display());
    }
    println!("Full account list saved to {}", summary.roster_path.display());
}

/// Prints the letter fetch summary.
pub fn print_letter_summary(summary: &LetterSummary) {
    let report = &summary.report;
    println!();
    println!("Letter check finished");
    println!("  With letters:   {}", report.with_content);
    println!("  Empty inboxes:  {}", report.empty);
    println!("  Failed:         {}", report.failed);
    println!("  Total letters:  {}", report.total_letters());
    print_failure_breakdown(report);
    print_interruption(report);

    if let Some(path) = &summary.manifest_path {
        println!("Letters saved for {} accounts", summary.saved.len());
        println!("Account list saved to {}", path.display());
    }
}
