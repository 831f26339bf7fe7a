//! Console display logic for the domain-sweep CLI.
//!
//! Progress goes to stderr so stdout stays clean for the plan and the
//! summary. On a terminal the per-batch counter rewrites one line; when
//! stderr is redirected every base gets plain lines instead.

use console::{style, Term};
use domain_sweep_lib::{BaseOutcome, ProgressReporter, RunSummary, SweepPlan};
use std::time::Duration;

// ── Progress ─────────────────────────────────────────────────────────────────

/// Progress reporter that writes base and batch counters to stderr.
pub struct ConsoleProgress {
    term: Term,
    live: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let term = Term::stderr();
        let live = term.is_term();
        Self { term, live }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn on_run_start(&self, total_bases: usize, pending_bases: usize) {
        let _ = self.term.write_line(&format!(
            "{} {} base{} ({} pending)",
            style("domain-sweep").bold(),
            total_bases,
            plural(total_bases),
            pending_bases
        ));
    }

    fn on_base_start(&self, base: &str, index: usize, total: usize, domains: usize, batches: usize) {
        let line = format!(
            "{} {}  {} domain{} in {} batch{}",
            style(format!("[{}/{}]", index, total)).dim(),
            base,
            domains,
            plural(domains),
            batches,
            if batches == 1 { "" } else { "es" }
        );
        if self.live {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&line);
        } else {
            let _ = self.term.write_line(&line);
        }
    }

    fn on_batch_done(&self, base: &str, batch: usize, batches: usize, answered: usize, expected: usize) {
        if !self.live {
            return;
        }
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&format!(
            "{} {}  batch {}/{}  {}/{} answered",
            style("…").dim(),
            base,
            batch,
            batches,
            answered,
            expected
        ));
    }

    fn on_base_finished(&self, base: &str, outcome: &BaseOutcome) {
        // already complete bases are only counted in the summary
        if matches!(outcome, BaseOutcome::AlreadyComplete { .. }) {
            return;
        }
        if self.live {
            let _ = self.term.clear_line();
        }
        let _ = self.term.write_line(&format_outcome(base, outcome));
    }
}

/// One line describing how a base ended.
pub fn format_outcome(base: &str, outcome: &BaseOutcome) -> String {
    match outcome {
        BaseOutcome::AlreadyComplete { domains } => {
            format!("  {} {} ({} recorded)", style("skip").dim(), base, domains)
        }
        BaseOutcome::Completed { records } => format!(
            "  {} {} ({} record{})",
            style("done").green().bold(),
            base,
            records,
            plural(*records)
        ),
        BaseOutcome::TimedOut { answered, expected } => format!(
            "  {} {} ({}/{} answered, retried next run)",
            style("timeout").yellow().bold(),
            base,
            answered,
            expected
        ),
        BaseOutcome::Failed { message } => {
            format!("  {} {} ({})", style("failed").red().bold(), base, message)
        }
    }
}

// ── Dry run ──────────────────────────────────────────────────────────────────

/// Print the resume plan computed by a dry run.
pub fn print_plan(plan: &SweepPlan) {
    for base in &plan.bases {
        let state = if base.complete {
            style("complete").green()
        } else {
            style("pending").yellow()
        };
        println!(
            "  {:<8} {}  {}/{} recorded",
            state, base.base, base.recorded, base.domains
        );
    }
    println!();
    println!("{}", format_plan_totals(plan));
}

pub fn format_plan_totals(plan: &SweepPlan) -> String {
    format!(
        "{} base{}: {} pending, {} complete | {} domain{} to query in {} request{}",
        plan.bases.len(),
        plural(plan.bases.len()),
        plan.pending_bases(),
        plan.complete_bases(),
        plan.pending_domains(),
        plural(plan.pending_domains()),
        plan.pending_batches(),
        plural(plan.pending_batches())
    )
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(summary: &RunSummary, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!("  {}", format_summary(summary, duration));

    if let Some(rows) = summary.exports.available_rows {
        println!("  {} available-only export: {} row{}", style("→").dim(), rows, plural(rows));
    }
    if let Some(rows) = summary.exports.priced_rows {
        println!("  {} priced export: {} row{}", style("→").dim(), rows, plural(rows));
    }
    if !summary.all_complete() {
        println!(
            "  {}",
            style("Some bases are incomplete; run again to retry them.").yellow()
        );
    }
}

pub fn format_summary(summary: &RunSummary, duration: Duration) -> String {
    format!(
        "{} base{} in {:.1}s  {}  {}  {}  {}  {}  {}  {}  {}",
        style(summary.total_bases).bold(),
        plural(summary.total_bases),
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} committed", summary.completed)).green(),
        style("|").dim(),
        style(format!("{} already complete", summary.already_complete)).dim(),
        style("|").dim(),
        style(format!("{} timed out", summary.timed_out)).yellow(),
        style("|").dim(),
        style(format!("{} failed", summary.failed)).red(),
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;
    use domain_sweep_lib::BasePlan;

    fn plan_base(base: &str, domains: usize, recorded: usize) -> BasePlan {
        BasePlan {
            base: base.to_string(),
            domains,
            recorded,
            complete: recorded == domains,
        }
    }

    #[test]
    fn test_format_outcome_lines() {
        let done = format_outcome("acme", &BaseOutcome::Completed { records: 2 });
        assert_eq!(strip_ansi_codes(&done), "  done acme (2 records)");

        let timeout = format_outcome(
            "beta",
            &BaseOutcome::TimedOut {
                answered: 3,
                expected: 4,
            },
        );
        assert_eq!(
            strip_ansi_codes(&timeout),
            "  timeout beta (3/4 answered, retried next run)"
        );

        let failed = format_outcome(
            "gamma",
            &BaseOutcome::Failed {
                message: "Connection error: Connection closed".to_string(),
            },
        );
        assert!(strip_ansi_codes(&failed).contains("failed gamma"));
    }

    #[test]
    fn test_format_plan_totals() {
        let plan = SweepPlan {
            bases: vec![plan_base("acme", 3, 3), plan_base("rocket", 3, 1)],
            batch_size: 2,
        };
        assert_eq!(
            strip_ansi_codes(&format_plan_totals(&plan)),
            "2 bases: 1 pending, 1 complete | 3 domains to query in 2 requests"
        );
    }

    #[test]
    fn test_format_summary_counts() {
        let summary = RunSummary {
            total_bases: 5,
            completed: 2,
            already_complete: 1,
            timed_out: 1,
            failed: 1,
            records_written: 6,
            ..Default::default()
        };
        let line = strip_ansi_codes(&format_summary(&summary, Duration::from_millis(1500)))
            .to_string();
        assert!(line.starts_with("5 bases in 1.5s"));
        assert!(line.contains("2 committed"));
        assert!(line.contains("1 already complete"));
        assert!(line.contains("1 timed out"));
        assert!(line.contains("1 failed"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(2), "s");
    }
}
