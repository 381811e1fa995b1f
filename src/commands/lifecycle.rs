//! Lifecycle commands
//!
//! - `diff` - refresh, plan against the manifest, show the changes
//! - `apply` - as `diff`, then run Create/Update/Delete and persist state
//! - `refresh` - Read every stored resource and persist confirmed values
//! - `destroy` - Delete stored resources

use anyhow::{Result, bail};
use declarative::{
    AutoConfirm, CallContext, ExecuteOptions, ExecuteReport, ExecutionPlan, Outcome,
    ResourceHandler, execute, refresh, store,
};

use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs, JobsArgs, TargetArgs};
use crate::engine::{self, ConsoleProgress, PromptConfirm};
use crate::manifest::Manifest;
use crate::provider::Provider;
use crate::state::ProviderState;
use crate::ui;

// ============================================================================
// Shared Steps
// ============================================================================

/// Build the provider from the manifest's `[provider]` block
fn configure(manifest: &Manifest) -> Result<Provider> {
    let mut provider = Provider::new();
    let diags = provider.configure(&manifest.provider);
    ui::diagnostics(Some("provider"), &diags);
    if diags.has_errors() {
        bail!("provider configuration failed");
    }
    Ok(provider)
}

/// Print the diagnostics of every outcome, returning how many failed
fn report_outcomes(outcomes: &[Outcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        ui::diagnostics(Some(outcome.id.as_str()), &outcome.diagnostics);
        if !outcome.is_success() {
            failed += 1;
        }
    }
    failed
}

/// Read every stored resource and fold the confirmed values into `state`
///
/// A failed Read keeps the stored values. Returns the number of failures.
fn refresh_state(
    handler: &dyn ResourceHandler,
    call: &CallContext,
    state: &mut ProviderState,
    jobs: usize,
) -> Result<usize> {
    if state.remote_schemas.is_empty() {
        return Ok(0);
    }
    log::info!("Refreshing {} remote schema(s)", state.remote_schemas.len());

    let outcomes = refresh(handler, call, &state.remote_schemas, jobs)?;
    for outcome in &outcomes {
        store(&mut state.remote_schemas, outcome);
    }
    Ok(report_outcomes(&outcomes))
}

/// Plan the manifest against refreshed state
fn plan_changes(
    handler: &dyn ResourceHandler,
    manifest: &Manifest,
    state: &ProviderState,
    target: Option<&str>,
) -> Result<ExecutionPlan> {
    let desired = manifest.remote_schemas()?;
    if let Some(t) = target
        && !desired.contains_key(t)
        && !state.remote_schemas.contains_key(t)
    {
        bail!("remote schema \"{t}\" is neither in the manifest nor in state");
    }

    let plan = ExecutionPlan::build(handler, &desired, &state.remote_schemas)
        .filter_by_target(target);
    for (id, diags) in &plan.rejected {
        ui::diagnostics(Some(id.as_str()), diags);
    }
    if !plan.is_valid() {
        bail!(
            "{} remote schema(s) in the manifest are invalid",
            plan.rejected.len()
        );
    }
    Ok(plan)
}

/// Run a plan, printing progress and diagnostics
fn run_plan(
    ctx: &Context,
    handler: &dyn ResourceHandler,
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    yes: bool,
) -> Result<ExecuteReport> {
    let call = &ctx.call;
    let mut progress = ConsoleProgress::new(ctx.quiet);

    let report = if yes {
        execute(plan, handler, call, opts, &mut progress, &mut AutoConfirm)?
    } else {
        execute(plan, handler, call, opts, &mut progress, &mut PromptConfirm)?
    };

    report_outcomes(&report.outcomes);
    Ok(report)
}

/// Persist the outcomes of a run and turn failures into an exit error
fn finish(
    ctx: &Context,
    state: &mut ProviderState,
    report: &ExecuteReport,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        println!();
        ui::info("Dry run - no changes made");
        return Ok(());
    }
    if report.outcomes.is_empty() {
        if report.summary.skipped > 0 {
            println!();
            ui::error("Aborted");
        }
        return Ok(());
    }

    report.apply_to(&mut state.remote_schemas);
    state.save(&ctx.state_path)?;
    engine::print_summary(&report.summary);

    if !report.summary.is_success() {
        bail!("{} lifecycle call(s) failed", report.summary.failed);
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

pub fn diff(ctx: &Context, args: &TargetArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest)?;
    let provider = configure(&manifest)?;
    let handler = provider.remote_schema();
    let mut state = ProviderState::load(&ctx.state_path)?;

    let refresh_failed = refresh_state(&handler, &ctx.call, &mut state, args.jobs.jobs)?;
    let plan = plan_changes(&handler, &manifest, &state, args.target.as_deref())?;
    engine::display_plan(handler.type_name(), &handler.schema(), &plan);

    if refresh_failed > 0 {
        bail!("refresh failed for {refresh_failed} remote schema(s)");
    }
    Ok(())
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest)?;
    let provider = configure(&manifest)?;
    let handler = provider.remote_schema();
    let mut state = ProviderState::load(&ctx.state_path)?;
    let jobs = args.target.jobs.jobs;

    let refresh_failed = refresh_state(&handler, &ctx.call, &mut state, jobs)?;
    if refresh_failed > 0 {
        bail!(
            "refresh failed for {refresh_failed} remote schema(s); \
             fix the errors above or drop them with `state rm` before applying"
        );
    }

    let plan = plan_changes(&handler, &manifest, &state, args.target.target.as_deref())?;
    engine::display_plan(handler.type_name(), &handler.schema(), &plan);

    if !plan.has_changes() {
        if !args.dry_run {
            state.save(&ctx.state_path)?;
        }
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs,
    };
    let report = run_plan(ctx, &handler, &plan, &opts, args.yes)?;
    finish(ctx, &mut state, &report, args.dry_run)
}

pub fn refresh_command(ctx: &Context, args: &JobsArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest)?;
    let provider = configure(&manifest)?;
    let handler = provider.remote_schema();
    let mut state = ProviderState::load(&ctx.state_path)?;

    if state.remote_schemas.is_empty() {
        ui::info("State is empty, nothing to refresh");
        return Ok(());
    }

    let failed = refresh_state(&handler, &ctx.call, &mut state, args.jobs)?;
    state.save(&ctx.state_path)?;

    let refreshed = state.remote_schemas.len() - failed;
    if !ctx.quiet {
        ui::success(&format!("Refreshed {refreshed} remote schema(s)"));
    }
    if failed > 0 {
        bail!("refresh failed for {failed} remote schema(s)");
    }
    Ok(())
}

pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let manifest = Manifest::load(&ctx.manifest)?;
    let provider = configure(&manifest)?;
    let handler = provider.remote_schema();
    let mut state = ProviderState::load(&ctx.state_path)?;

    if let Some(name) = &args.name
        && !state.remote_schemas.contains_key(name)
    {
        bail!("remote schema \"{name}\" is not in state");
    }

    let plan = ExecutionPlan::destroy(&state.remote_schemas).filter_by_target(args.name.as_deref());
    engine::display_plan(handler.type_name(), &handler.schema(), &plan);
    if !plan.has_changes() {
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.jobs,
    };
    let report = run_plan(ctx, &handler, &plan, &opts, args.yes)?;
    finish(ctx, &mut state, &report, args.dry_run)
}
