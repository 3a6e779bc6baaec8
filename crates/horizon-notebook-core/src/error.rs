//! Error types for Horizon Notebook core systems.

use std::fmt;

/// The main error type for Horizon Notebook core operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookError {
    /// Update scheduler error.
    Scheduler(SchedulerError),
}

impl fmt::Display for NotebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduler(err) => write!(f, "Scheduler error: {err}"),
        }
    }
}

impl std::error::Error for NotebookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scheduler(err) => Some(err),
        }
    }
}

/// Update scheduler errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No update is pending for the given target.
    NotPending,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPending => write!(f, "No update is pending for this target"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<SchedulerError> for NotebookError {
    fn from(err: SchedulerError) -> Self {
        Self::Scheduler(err)
    }
}

/// A specialized Result type for Horizon Notebook core operations.
pub type Result<T> = std::result::Result<T, NotebookError>;
