//! State inspection commands

use anyhow::{Result, bail};
use declarative::{Attributes, ResourceHandler};

use crate::Context;
use crate::provider::Provider;
use crate::state::ProviderState;
use crate::ui;

/// Print stored remote schemas, sensitive values masked
pub fn show(ctx: &Context, name: Option<&str>) -> Result<()> {
    let state = ProviderState::load(&ctx.state_path)?;
    let handler = Provider::new().remote_schema();
    let schema = handler.schema();

    if let Some(n) = name
        && !state.remote_schemas.contains_key(n)
    {
        bail!("remote schema \"{n}\" is not in state");
    }

    ui::header(&format!("State: {}", ctx.state_path.display()));
    if let Some(at) = state.last_updated {
        ui::kv("last updated", &at.to_rfc3339());
    }
    if state.remote_schemas.is_empty() {
        ui::dim("(empty)");
        return Ok(());
    }

    for (id, attrs) in &state.remote_schemas {
        if name.is_some_and(|n| n != id) {
            continue;
        }
        ui::section(&format!("{}.{id}", handler.type_name()));
        ui::attributes(&schema, attrs);
    }
    Ok(())
}

/// Drop a remote schema from state; the registration itself is left alone
pub fn rm(ctx: &Context, name: &str) -> Result<()> {
    let mut state = ProviderState::load(&ctx.state_path)?;
    forget(&mut state, name)?;
    state.save(&ctx.state_path)?;

    if !ctx.quiet {
        ui::success(&format!("Removed \"{name}\" from state"));
    }
    Ok(())
}

fn forget(state: &mut ProviderState, name: &str) -> Result<Attributes> {
    match state.remote_schemas.remove(name) {
        Some(attrs) => Ok(attrs),
        None => bail!("remote schema \"{name}\" is not in state"),
    }
}
