//! Console side of the lifecycle engine
//!
//! Planning, execution and state reconciliation live in the `declarative`
//! crate; this module renders plans and wires progress and confirmation
//! to the terminal.

pub mod differ;
pub mod executor;

pub use differ::display_plan;
pub use executor::{ConsoleProgress, PromptConfirm, print_summary};
