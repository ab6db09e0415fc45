//! Diagnostic side channel for human-readable progress and error messages.
//!
//! A sink is injected once into [`crate::PointCloudData`] instead of being
//! threaded through every call. Messages are fire-and-forget.

use std::sync::Mutex;

/// Receiver of diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
  fn message(&self, message: &str);
}

impl<F> DiagnosticSink for F
where
  F: Fn(&str) + Send + Sync,
{
  fn message(&self, message: &str) {
    self(message)
  }
}

/// Forwards messages to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
  fn message(&self, message: &str) {
    tracing::info!(target: "pointcloud", "{message}");
  }
}

/// Drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
  fn message(&self, _message: &str) {}
}

/// Records messages for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
  messages: Mutex<Vec<String>>,
}

impl CollectingSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Messages received so far, oldest first.
  pub fn messages(&self) -> Vec<String> {
    match self.messages.lock() {
      Ok(guard) => guard.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  /// Remove and return all messages.
  pub fn drain(&self) -> Vec<String> {
    match self.messages.lock() {
      Ok(mut guard) => std::mem::take(&mut *guard),
      Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
  }
}

impl DiagnosticSink for CollectingSink {
  fn message(&self, message: &str) {
    match self.messages.lock() {
      Ok(mut guard) => guard.push(message.to_owned()),
      Err(poisoned) => poisoned.into_inner().push(message.to_owned()),
    }
  }
}
