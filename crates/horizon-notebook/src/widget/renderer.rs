//! The renderer strategy that builds a cell's sub-widgets.
//!
//! Cells never construct their editor, input area or output area directly;
//! they ask a [`CellRenderer`]. Swapping the renderer swaps the concrete
//! sub-widgets without touching cell logic.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_notebook::widget::{CellEditor, CellRenderer, PlainTextEditor};
//!
//! struct ReadOnlyRenderer;
//!
//! impl CellRenderer for ReadOnlyRenderer {
//!     fn create_cell_editor(&self) -> Arc<dyn CellEditor> {
//!         let editor = PlainTextEditor::new();
//!         editor.set_read_only(true);
//!         Arc::new(editor)
//!     }
//! }
//! ```

use std::sync::Arc;

use super::widgets::{
    CellEditor, InputArea, InputAreaWidget, OutputArea, OutputAreaWidget, OutputContext,
    PlainTextEditor,
};

/// Builds the sub-widgets of a cell.
///
/// Implementations hold no per-cell state; one renderer is shared by any
/// number of cells. Each call returns a new sub-widget.
pub trait CellRenderer: Send + Sync {
    /// Create the text editor.
    fn create_cell_editor(&self) -> Arc<dyn CellEditor>;

    /// Create the input area around `editor`.
    fn create_input_area(&self, editor: Arc<dyn CellEditor>) -> Arc<dyn InputArea> {
        Arc::new(InputAreaWidget::new(editor))
    }

    /// Create the output area of a code cell.
    fn create_output_area(&self, context: OutputContext) -> Arc<dyn OutputArea> {
        Arc::new(OutputAreaWidget::new(context))
    }
}

/// Builds the built-in sub-widgets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer;

impl CellRenderer for DefaultRenderer {
    fn create_cell_editor(&self) -> Arc<dyn CellEditor> {
        Arc::new(PlainTextEditor::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_call_builds_a_new_editor() {
        let renderer = DefaultRenderer;
        let a = renderer.create_cell_editor();
        let b = renderer.create_cell_editor();
        assert!(!Arc::ptr_eq(&a, &b));

        a.set_text("only a");
        assert_eq!(b.text(), "");
    }

    #[test]
    fn test_input_area_wraps_given_editor() {
        let renderer = DefaultRenderer;
        let editor = renderer.create_cell_editor();
        let area = renderer.create_input_area(editor.clone());
        assert!(Arc::ptr_eq(area.editor(), &editor));
    }
}
