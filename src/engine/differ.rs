//! Plan display

use crate::ui;
use colored::Colorize;
use declarative::{Action, Change, DiffSummary, ExecutionPlan, Schema, attribute_changes};

/// Colored action symbol
fn symbol(action: Action) -> colored::ColoredString {
    match action {
        Action::Create => action.symbol().green(),
        Action::Update => action.symbol().yellow(),
        Action::Delete => action.symbol().red(),
        Action::Read | Action::NoChange => action.symbol().dimmed(),
    }
}

/// One line per changed attribute, values masked per schema
pub fn describe_change(schema: &Schema, change: &Change) -> Vec<String> {
    attribute_changes(change)
        .into_iter()
        .map(|c| {
            let before = ui::format_value(schema, &c.name, c.before.as_ref());
            let after = ui::format_value(schema, &c.name, c.after.as_ref());
            match (change.action, &c.before, &c.after) {
                (Action::Create, ..) | (_, None, Some(_)) => format!("{} = {after}", c.name),
                (Action::Delete, ..) | (_, Some(_), None) => format!("{} = {before}", c.name),
                _ => format!("{} = {before} → {after}", c.name),
            }
        })
        .collect()
}

/// Display a plan in a user-friendly format
pub fn display_plan(type_name: &str, schema: &Schema, plan: &ExecutionPlan) {
    let summary = DiffSummary::from_plan(plan);
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Planned Changes".bold()
    );
    println!("│");
    println!("│ {}", type_name.bold());

    for change in plan.pending() {
        println!(
            "│   {} {:<30} {}",
            symbol(change.action),
            change.id,
            format!("({})", change.action).dimmed()
        );
        for line in describe_change(schema, change) {
            println!("│       {}", line.dimmed());
        }
    }

    println!("│");
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to add, {} to change, {} to destroy",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
