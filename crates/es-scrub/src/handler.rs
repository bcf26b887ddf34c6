//! Error reporting hooks.
//!
//! The scrubber never returns errors while scrubbing. It logs them and hands
//! an [`ErrorReport`] to the configured [`ErrorHandler`] so an application can
//! alert on broken rules instead of leaking data silently.

use crate::error::HandlerError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A failure observed while scrubbing one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives error reports from a [`Scrubber`](crate::Scrubber).
///
/// Failures and panics of the handler itself are logged and dropped.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, report: &ErrorReport) -> Result<(), HandlerError>;

    /// Name used when logging a failure of this handler.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> ErrorHandler for F
where
    F: Fn(&ErrorReport) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, report: &ErrorReport) -> Result<(), HandlerError> {
        self(report)
    }
}

/// Handler that keeps every report in memory.
///
/// Clones share the same storage, so one clone can be given to the scrubber
/// and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    reports: Arc<Mutex<Vec<ErrorReport>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.reports().into_iter().map(|r| r.message).collect()
    }

    pub fn clear(&self) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl ErrorHandler for ErrorCollector {
    fn handle(&self, report: &ErrorReport) -> Result<(), HandlerError> {
        self.reports
            .lock()
            .map_err(|_| "error collector lock poisoned")?
            .push(report.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "ErrorCollector"
    }
}
