// Lifecycle commands (diff, apply, refresh, destroy)
pub mod lifecycle;

// State inspection
pub mod state;
