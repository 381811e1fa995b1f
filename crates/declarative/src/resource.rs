//! Resource handler trait for declarative lifecycle management
//!
//! A handler answers the four lifecycle calls for one resource type. Each
//! call runs to completion and reports back a [`StateChange`] plus
//! diagnostics; the handler never persists state itself.

use crate::context::CallContext;
use crate::schema::Schema;
use crate::types::{Attributes, Diagnostic, Diagnostics};
use std::fmt;

/// What a lifecycle call wants done with the stored state
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Leave the stored state as it was
    Unchanged,
    /// Replace the stored state with these attributes
    Set(Attributes),
    /// Drop the resource from state
    Removed,
}

/// Result of a lifecycle call
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub state: StateChange,
    pub diagnostics: Diagnostics,
}

impl Response {
    /// Successful call that stores `state`
    pub fn set(state: Attributes) -> Self {
        Self {
            state: StateChange::Set(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Successful call that removes the resource
    pub fn removed() -> Self {
        Self {
            state: StateChange::Removed,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Failed call; the stored state must not change
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            state: StateChange::Unchanged,
            diagnostics: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Resolve the state to store given the prior state
    ///
    /// A response carrying any error diagnostic leaves the prior state
    /// untouched, whatever its `state` field says.
    pub fn reconcile(&self, prior: Option<Attributes>) -> Option<Attributes> {
        if self.diagnostics.has_errors() {
            return prior;
        }
        match &self.state {
            StateChange::Unchanged => prior,
            StateChange::Set(attrs) => Some(attrs.clone()),
            StateChange::Removed => None,
        }
    }
}

/// Result of the plan step
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResponse {
    /// Proposed attributes with computed defaults filled in
    pub planned: Attributes,
    pub diagnostics: Diagnostics,
}

/// Core trait for resource types exposed to the engine
pub trait ResourceHandler: Send + Sync + fmt::Debug {
    /// Resource type name, e.g. "hasura_remote_schema"
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the resource
    fn schema(&self) -> Schema;

    /// Validate and normalise proposed attributes
    ///
    /// The default implementation only validates against [`Self::schema`].
    fn plan(&self, _prior: Option<&Attributes>, proposed: &Attributes) -> PlanResponse {
        PlanResponse {
            planned: proposed.clone(),
            diagnostics: self.schema().validate(proposed),
        }
    }

    /// Create the resource from planned attributes
    fn create(&self, ctx: &CallContext, planned: &Attributes) -> Response;

    /// Refresh the stored state from the remote system
    fn read(&self, ctx: &CallContext, current: &Attributes) -> Response;

    /// Update the resource in place
    fn update(&self, ctx: &CallContext, prior: &Attributes, planned: &Attributes) -> Response;

    /// Delete the resource
    fn delete(&self, ctx: &CallContext, current: &Attributes) -> Response;
}
