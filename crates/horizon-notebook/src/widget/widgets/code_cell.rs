//! Code cells: an input area plus outputs produced by running the source.

use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use crate::kernel::{ExecuteRequest, ExecutionBackend, ExecutionStatus};
use crate::model::OutputPayload;
use crate::widget::base::{CellInner, CellOptions, CellVariant, CellWidget};

use super::output_area::OutputArea;

/// Code-cell-specific widget state.
pub(crate) struct CodeState {
    pub(crate) output_area: Arc<dyn OutputArea>,
    pub(crate) collapsed: bool,
}

impl CodeState {
    pub(crate) fn new(output_area: Arc<dyn OutputArea>) -> Self {
        Self {
            output_area,
            collapsed: false,
        }
    }
}

/// How a call to [`CodeCell::execute`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The source was blank; the backend was not contacted.
    Skipped,
    /// The code ran to completion.
    Completed {
        /// The counter the backend assigned.
        execution_count: u32,
    },
    /// The code raised, the backend aborted it, or the backend could not be
    /// reached. The problem is shown as an error output where possible.
    Failed {
        /// The counter the backend assigned, if a reply arrived.
        execution_count: Option<u32>,
    },
    /// The widget was disposed or had no model; results were discarded.
    Dropped,
}

impl ExecuteOutcome {
    /// Whether the backend ran the code successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The execution count reported by the backend, if any.
    pub fn execution_count(&self) -> Option<u32> {
        match self {
            Self::Completed { execution_count } => Some(*execution_count),
            Self::Failed { execution_count } => *execution_count,
            Self::Skipped | Self::Dropped => None,
        }
    }
}

/// A code cell widget.
///
/// Dereferences to [`CellWidget`] for everything cells have in common.
///
/// # Example
///
/// ```no_run
/// use horizon_notebook::kernel::ExecutionBackend;
/// use horizon_notebook::model::{CellModel, CellType};
/// use horizon_notebook::widget::{CellOptions, CodeCell};
///
/// async fn run(backend: &dyn ExecutionBackend) {
///     let cell = CodeCell::new(&CellOptions::default());
///     cell.set_model(Some(CellModel::with_source(CellType::Code, "1 + 1")));
///
///     let outcome = cell.execute(backend).await;
///     println!("{outcome:?}, outputs: {:?}", cell.outputs());
/// }
/// ```
#[derive(Clone)]
pub struct CodeCell {
    widget: CellWidget,
    output_area: Arc<dyn OutputArea>,
}

impl CodeCell {
    /// Create a code cell.
    pub fn new(options: &CellOptions) -> Self {
        let output_area = options
            .renderer
            .create_output_area(options.output_context());
        let widget = CellWidget::build(
            CellVariant::Code(CodeState::new(output_area.clone())),
            options,
        );
        Self {
            widget,
            output_area,
        }
    }

    /// View a generic cell widget as a code cell.
    ///
    /// Gives the widget back if it is not a code cell.
    pub fn from_widget(widget: CellWidget) -> Result<Self, CellWidget> {
        match widget.inner().output_area() {
            Some(output_area) => Ok(Self {
                widget,
                output_area,
            }),
            None => Err(widget),
        }
    }

    /// The generic widget handle.
    pub fn widget(&self) -> &CellWidget {
        &self.widget
    }

    /// The output area sub-widget.
    pub fn output_area(&self) -> &Arc<dyn OutputArea> {
        &self.output_area
    }

    /// The current outputs, oldest first.
    pub fn outputs(&self) -> Vec<OutputPayload> {
        self.output_area.outputs()
    }

    /// Remove all outputs.
    pub fn clear_outputs(&self) {
        if self.is_disposed() {
            return;
        }
        self.output_area.clear();
        self.update();
    }

    /// Whether the outputs are hidden.
    pub fn is_collapsed(&self) -> bool {
        self.widget
            .inner()
            .with_variant(|variant| matches!(variant, CellVariant::Code(code) if code.collapsed))
    }

    /// Hide or show the outputs.
    ///
    /// The choice is stored in the model's `collapsed` metadata when a model
    /// is bound, so it travels with the document.
    pub fn set_collapsed(&self, collapsed: bool) {
        if self.is_disposed() {
            return;
        }
        let model = self.model();
        if let Some(model) = model {
            model.set_metadata("collapsed", Value::Bool(collapsed));
        }
        if self.widget.inner().apply_collapsed(collapsed) {
            self.update();
        }
    }

    /// Run the cell's source on `backend`.
    ///
    /// Blank source is not sent. Otherwise the outputs are cleared, the
    /// source is sent, and the reply's execution count and outputs are
    /// applied. Errors raised by the code, and failures to reach the backend,
    /// become error outputs; this never fails from the caller's point of
    /// view. If the widget is disposed while the request is in flight the
    /// reply is discarded.
    ///
    /// Concurrent calls are independent requests.
    #[tracing::instrument(
        skip_all,
        target = "horizon_notebook::kernel",
        fields(cell = self.id().as_u64())
    )]
    pub async fn execute<B>(&self, backend: &B) -> ExecuteOutcome
    where
        B: ExecutionBackend + ?Sized,
    {
        let inner = self.widget.inner();
        if inner.is_disposed() {
            return ExecuteOutcome::Dropped;
        }
        let Some(model) = inner.model() else {
            tracing::debug!(target: "horizon_notebook::kernel", "execute without a model");
            return ExecuteOutcome::Dropped;
        };
        if model.is_source_blank() {
            tracing::debug!(target: "horizon_notebook::kernel", "blank source, not executing");
            return ExecuteOutcome::Skipped;
        }

        let request = ExecuteRequest::new(model.source());
        self.output_area.clear();
        inner.set_prompt_text("*");
        inner.request_update();

        let reply = backend.execute(request).await;

        if inner.is_disposed() {
            tracing::debug!(
                target: "horizon_notebook::kernel",
                "cell disposed during execution, dropping reply"
            );
            return ExecuteOutcome::Dropped;
        }
        let still_bound = inner
            .model()
            .is_some_and(|current| Arc::ptr_eq(&current, &model));
        let trusted = model.trusted();

        let outcome = match reply {
            Ok(reply) => {
                model.set_execution_count(Some(reply.execution_count));
                let has_error_output = reply.outputs.iter().any(OutputPayload::is_error);
                if still_bound {
                    for output in reply.outputs {
                        self.output_area.append(output, trusted);
                    }
                }
                match reply.status {
                    ExecutionStatus::Ok => ExecuteOutcome::Completed {
                        execution_count: reply.execution_count,
                    },
                    ExecutionStatus::Error {
                        ename,
                        evalue,
                        traceback,
                    } => {
                        tracing::debug!(
                            target: "horizon_notebook::kernel",
                            %ename,
                            "execution raised"
                        );
                        if still_bound && !has_error_output {
                            self.output_area
                                .append(OutputPayload::error(ename, evalue, traceback), trusted);
                        }
                        ExecuteOutcome::Failed {
                            execution_count: Some(reply.execution_count),
                        }
                    }
                    ExecutionStatus::Aborted => {
                        tracing::debug!(
                            target: "horizon_notebook::kernel",
                            "execution aborted by backend"
                        );
                        ExecuteOutcome::Failed {
                            execution_count: Some(reply.execution_count),
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(
                    target: "horizon_notebook::kernel",
                    error = %err,
                    "execution request failed"
                );
                if still_bound {
                    self.output_area.append(
                        OutputPayload::error("KernelError", err.to_string(), Vec::new()),
                        trusted,
                    );
                }
                ExecuteOutcome::Failed {
                    execution_count: None,
                }
            }
        };

        if still_bound {
            inner.show_execution_count(model.execution_count());
        }
        inner.request_update();
        outcome
    }
}

impl Deref for CodeCell {
    type Target = CellWidget;

    fn deref(&self) -> &CellWidget {
        &self.widget
    }
}

impl std::fmt::Debug for CodeCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeCell")
            .field("widget", &self.widget)
            .field("outputs", &self.output_area.len())
            .field("collapsed", &self.is_collapsed())
            .finish()
    }
}

impl From<CodeCell> for CellWidget {
    fn from(cell: CodeCell) -> Self {
        cell.widget
    }
}

static_assertions::assert_impl_all!(CodeCell: Send, Sync);

impl CellInner {
    /// Show or hide a code cell's outputs. Returns whether anything changed.
    pub(crate) fn apply_collapsed(&self, collapsed: bool) -> bool {
        let output_area = self.with_variant(|variant| match variant {
            CellVariant::Code(code) if code.collapsed != collapsed => {
                code.collapsed = collapsed;
                Some(code.output_area.clone())
            }
            _ => None,
        });
        match output_area {
            Some(output_area) => {
                output_area.set_hidden(collapsed);
                true
            }
            None => false,
        }
    }

    /// Show an execution count as the prompt.
    pub(crate) fn show_execution_count(&self, count: Option<u32>) {
        let text = count.map(|count| count.to_string()).unwrap_or_default();
        self.set_prompt_text(&text);
    }
}
