//! Resource handlers exposed by the provider
//!
//! Handlers turn every failure into a [`Diagnostic`] on the lifecycle
//! response; nothing in here returns a Rust error to the engine.

pub mod remote_schema;

pub use remote_schema::RemoteSchemaResource;

use declarative::{DecodeError, Diagnostic};

/// Diagnostic for calls made after provider configuration failed
pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "The Hasura provider could not be configured, so the admin API cannot be called. \
         Fix the provider configuration errors reported earlier.",
    )
}

/// Diagnostic for attributes that do not decode into their Rust types
pub fn decode_failed(err: &DecodeError) -> Diagnostic {
    Diagnostic::error("Invalid resource attributes", err.to_string())
}
