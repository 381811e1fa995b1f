//! # Declarative
//!
//! The boundary between a declarative infrastructure engine and the
//! resource handlers that talk to remote systems.
//!
//! ## Core Concepts
//!
//! - **Value / Attributes**: typed attribute values handed over by the engine
//! - **Schema**: attribute declarations plus fail-closed typed getters
//! - **ResourceHandler**: the Create/Read/Update/Delete lifecycle of one
//!   resource type
//! - **ExecutionPlan**: which lifecycle call each resource needs
//! - **Executor**: runs the calls and reconciles state, keeping the prior
//!   state for any call that reported an error
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Attributes, CallContext, ExecutionPlan, ExecuteOptions, AutoConfirm, NoProgress,
//! };
//!
//! let plan = ExecutionPlan::build(&handler, &desired, &current);
//! let report = declarative::execute(
//!     &plan,
//!     &handler,
//!     &CallContext::new(),
//!     &ExecuteOptions::default(),
//!     &mut NoProgress,
//!     &mut AutoConfirm,
//! )?;
//! report.apply_to(&mut current);
//! ```

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, CallContext, CancelToken, ConfirmCallback, Interrupted, NoProgress,
    ProgressCallback,
};
pub use diff::{AttributeChange, DiffSummary, attribute_changes};
pub use executor::{ExecuteReport, Outcome, apply_change, execute, refresh, store};
pub use planner::{Action, Change, ExecutionPlan};
pub use resource::{PlanResponse, ResourceHandler, Response, StateChange};
pub use schema::{AttributeKind, AttributeSchema, DecodeError, Schema};
pub use types::{
    Attributes, Diagnostic, Diagnostics, ExecuteOptions, ExecuteSummary, Severity, Value,
};
