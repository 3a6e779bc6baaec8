//! Logging facilities for Horizon Notebook.
//!
//! Horizon Notebook uses the `tracing` crate for instrumentation. Install a
//! subscriber in your application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_notebook=debug,horizon_notebook_core=trace")
//!     .init();
//! ```
//!
//! Every subsystem logs under a fixed target (see [`targets`]) so that
//! filters can single out, for example, scheduler traffic.

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_notebook_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_notebook_core::signal";
    /// Update scheduler target.
    pub const SCHEDULER: &str = "horizon_notebook_core::scheduler";
    /// Cell model target.
    pub const MODEL: &str = "horizon_notebook::model";
    /// Cell widget target.
    pub const WIDGET: &str = "horizon_notebook::widget";
    /// Execution backend target.
    pub const KERNEL: &str = "horizon_notebook::kernel";
    /// Output rendering target.
    pub const RENDERMIME: &str = "horizon_notebook::rendermime";
    /// Settings loading target.
    pub const SETTINGS: &str = "horizon_notebook::settings";
}

/// Span names used for performance tracing.
pub mod span_names {
    /// Performance spans.
    pub const PERF: &str = "horizon_notebook::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time reconciliation passes and code execution.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_notebook::perf", "perf", operation);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[test]
    fn test_targets_are_namespaced() {
        assert!(targets::SIGNAL.starts_with(targets::CORE));
        assert!(targets::SCHEDULER.starts_with(targets::CORE));
        assert!(targets::WIDGET.starts_with("horizon_notebook::"));
    }
}
