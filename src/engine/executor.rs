//! Console integration for the declarative executor

use anyhow::Result;
use colored::Colorize;
use declarative::{Action, ConfirmCallback, ExecuteSummary, Outcome, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner while a batch runs, one line per finished resource
pub struct ConsoleProgress {
    spinner: Option<ProgressBar>,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: None,
            quiet,
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Applying {count} change(s)..."));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn on_resource_complete(&mut self, outcome: &Outcome) {
        let line = outcome_line(outcome);
        match &self.spinner {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None if !self.quiet => println!("{line}"),
            None => {}
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

fn outcome_line(outcome: &Outcome) -> String {
    let verb = match outcome.action {
        Action::Create => "created",
        Action::Update => "updated",
        Action::Delete => "deleted",
        Action::Read => "refreshed",
        Action::NoChange => "unchanged",
    };
    if outcome.is_success() {
        format!("  {} {} {}", "✓".green(), outcome.id, verb.dimmed())
    } else {
        format!("  {} {} {}", "✗".red(), outcome.id, "failed".red())
    }
}

/// Interactive confirmation
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.total() == summary.no_change {
        return;
    }
    if summary.is_success() {
        println!("  {} Changes applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Changes applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} remote schema(s) created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} remote schema(s) updated", summary.updated);
    }
    if summary.deleted > 0 {
        println!("    • {} remote schema(s) deleted", summary.deleted);
    }
    if summary.refreshed > 0 {
        println!("    • {} remote schema(s) refreshed", summary.refreshed);
    }
    if summary.skipped > 0 {
        println!("    • {} change(s) skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "change(s)".red());
    }
}
