use colored::Colorize;
use declarative::{Attributes, Diagnostic, Diagnostics, Schema, Severity, Value};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Print one diagnostic, prefixed with the resource it belongs to
pub fn diagnostic(resource: Option<&str>, diag: &Diagnostic) {
    let scope = resource.map(|r| format!("{r}: ")).unwrap_or_default();
    match diag.severity {
        Severity::Error => error(&format!("{scope}{}", diag.summary.bold())),
        Severity::Warning => warn(&format!("{scope}{}", diag.summary.bold())),
    }
    if !diag.detail.is_empty() {
        for line in diag.detail.lines() {
            if diag.is_error() {
                eprintln!("    {}", line.dimmed());
            } else {
                dim(&format!("  {line}"));
            }
        }
    }
}

/// Print every diagnostic of a call
pub fn diagnostics(resource: Option<&str>, diags: &Diagnostics) {
    for diag in diags {
        diagnostic(resource, diag);
    }
}

// ============================================================================
// Attribute Formatting
// ============================================================================

/// Placeholder shown instead of sensitive values
pub const SENSITIVE: &str = "(sensitive value)";

/// Format an attribute value for display, masking sensitive attributes
pub fn format_value(schema: &Schema, name: &str, value: Option<&Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(_) if schema.sensitive_attributes().any(|s| s == name) => SENSITIVE.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Print all attributes of a resource, one per line
pub fn attributes(schema: &Schema, attrs: &Attributes) {
    let width = attrs.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in attrs {
        println!(
            "    {:<width$} = {}",
            name,
            format_value(schema, name, Some(value)),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
