//! Call context and callback traits
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific UI for progress or confirmation.

use crate::executor::Outcome;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared flag used to cancel in-flight lifecycle calls
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every call holding this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a call was not allowed to proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("operation was cancelled")]
    Cancelled,
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Context passed to every lifecycle call
///
/// Carries the caller's cancellation token and optional deadline. Outbound
/// calls check it before they start and while they wait, and use
/// [`CallContext::remaining`] as their transport timeout.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancelToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancelToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Use an existing cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail if the call was cancelled or its deadline has passed
    pub fn check(&self) -> std::result::Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.remaining().is_some_and(|r| r.is_zero()) {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called when starting a batch of lifecycle calls
    fn on_batch_start(&mut self, count: usize);

    /// Called when a single resource finished
    fn on_resource_complete(&mut self, outcome: &Outcome);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_resource_complete(&mut self, _outcome: &Outcome) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
