//! Execution engine - runs lifecycle calls and reconciles state

use crate::context::{CallContext, ConfirmCallback, ProgressCallback};
use crate::planner::{Action, Change, ExecutionPlan};
use crate::resource::{ResourceHandler, Response, StateChange};
use crate::types::{Attributes, Diagnostic, Diagnostics, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Result of running one lifecycle call
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: String,
    pub action: Action,
    /// State to store after the call; `None` means the resource is gone
    pub state: Option<Attributes>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Report of an execution run
#[derive(Debug, Default)]
pub struct ExecuteReport {
    pub summary: ExecuteSummary,
    pub outcomes: Vec<Outcome>,
}

impl ExecuteReport {
    /// Write every outcome back into a state map
    pub fn apply_to(&self, state: &mut BTreeMap<String, Attributes>) {
        for outcome in &self.outcomes {
            store(state, outcome);
        }
    }
}

/// Write a single outcome back into a state map
pub fn store(state: &mut BTreeMap<String, Attributes>, outcome: &Outcome) {
    match &outcome.state {
        Some(attrs) => {
            state.insert(outcome.id.clone(), attrs.clone());
        }
        None => {
            state.remove(&outcome.id);
        }
    }
}

/// Run the lifecycle call for one planned change
///
/// The returned state is the prior state whenever the call reported an
/// error, so a failed call never alters what is stored.
pub fn apply_change(handler: &dyn ResourceHandler, ctx: &CallContext, change: &Change) -> Outcome {
    let response = match (change.action, &change.prior, &change.planned) {
        (Action::Create, _, Some(planned)) => handler.create(ctx, planned),
        (Action::Update, Some(prior), Some(planned)) => handler.update(ctx, prior, planned),
        (Action::Delete, Some(prior), _) => handler.delete(ctx, prior),
        (Action::Read, Some(prior), _) => handler.read(ctx, prior),
        (Action::NoChange, ..) => Response {
            state: StateChange::Unchanged,
            diagnostics: Diagnostics::new(),
        },
        (action, ..) => Response::failed(Diagnostic::error(
            "Invalid planned change",
            format!("Cannot {action} \"{}\" without the required state", change.id),
        )),
    };

    log::debug!(
        "{} {}: {}",
        change.action,
        change.id,
        if response.is_success() { "ok" } else { "failed" }
    );

    Outcome {
        id: change.id.clone(),
        action: change.action,
        state: response.reconcile(change.prior.clone()),
        diagnostics: response.diagnostics,
    }
}

/// Refresh every resource in `current` from the remote system
pub fn refresh(
    handler: &dyn ResourceHandler,
    ctx: &CallContext,
    current: &BTreeMap<String, Attributes>,
    jobs: usize,
) -> Result<Vec<Outcome>> {
    let changes: Vec<Change> = current
        .iter()
        .map(|(id, attrs)| Change {
            id: id.clone(),
            action: Action::Read,
            prior: Some(attrs.clone()),
            planned: None,
        })
        .collect();

    run_batch(handler, ctx, &changes, jobs)
}

/// Execute a plan with the given options and callbacks
///
/// Distinct resources are handled in parallel with up to `opts.jobs`
/// workers; each resource sees its lifecycle call run exactly once.
pub fn execute<P, C>(
    plan: &ExecutionPlan,
    handler: &dyn ResourceHandler,
    ctx: &CallContext,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteReport>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let pending: Vec<Change> = plan.pending().cloned().collect();
    let mut report = ExecuteReport::default();
    report.summary.no_change = plan.changes.len() - pending.len();

    if pending.is_empty() {
        return Ok(report);
    }

    if opts.dry_run {
        report.summary.skipped = pending.len();
        return Ok(report);
    }

    if !confirm.confirm("Apply changes?")? {
        report.summary.skipped = pending.len();
        return Ok(report);
    }

    progress.on_batch_start(pending.len());
    let outcomes = run_batch(handler, ctx, &pending, opts.jobs)?;
    for outcome in &outcomes {
        progress.on_resource_complete(outcome);
        add_outcome(&mut report.summary, outcome);
    }
    progress.on_batch_complete();

    report.outcomes = outcomes;
    Ok(report)
}

fn add_outcome(summary: &mut ExecuteSummary, outcome: &Outcome) {
    if !outcome.is_success() {
        summary.failed += 1;
        return;
    }
    match outcome.action {
        Action::Create => summary.created += 1,
        Action::Update => summary.updated += 1,
        Action::Delete => summary.deleted += 1,
        Action::Read => summary.refreshed += 1,
        Action::NoChange => summary.no_change += 1,
    }
}

/// Run a batch of changes, preserving input order in the result
fn run_batch(
    handler: &dyn ResourceHandler,
    ctx: &CallContext,
    changes: &[Change],
    jobs: usize,
) -> Result<Vec<Outcome>> {
    if jobs <= 1 || changes.len() <= 1 {
        return Ok(changes
            .iter()
            .map(|change| apply_change(handler, ctx, change))
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    Ok(pool.install(|| {
        changes
            .par_iter()
            .map(|change| apply_change(handler, ctx, change))
            .collect()
    }))
}
