//! Cell widgets.
//!
//! This module provides the view layer for notebook cells:
//!
//! - [`CellWidget`]: the state shared by every cell kind
//! - [`CodeCell`], [`MarkdownCell`], [`RawCell`]: the three cell kinds
//! - [`CellRenderer`]: the strategy that builds a cell's sub-widgets
//! - [`CellOptions`]: the collaborators a cell is built with
//!
//! # Overview
//!
//! A cell widget is a view onto a shared [`CellModel`](crate::model::CellModel).
//! The widget subscribes to the model's change signals; edits made in the
//! editor are written back to the model, and changes made to the model from
//! anywhere show up in the editor. Anything that affects presentation
//! requests an update from the [`UpdateScheduler`](horizon_notebook_core::UpdateScheduler),
//! which coalesces requests so each widget reconciles at most once per frame.
//!
//! ```
//! use std::sync::Arc;
//! use horizon_notebook::model::CellModel;
//! use horizon_notebook::widget::{CellEditor, CellOptions, CodeCell, READ_ONLY_CLASS};
//! use horizon_notebook_core::UpdateScheduler;
//!
//! let scheduler = Arc::new(UpdateScheduler::new());
//! let options = CellOptions::default().with_scheduler(scheduler.clone());
//!
//! let cell = CodeCell::new(&options);
//! let model = CellModel::code();
//! cell.set_model(Some(model.clone()));
//!
//! cell.editor().set_text("print('hi')");
//! assert_eq!(model.source(), "print('hi')");
//!
//! cell.set_read_only(true);
//! cell.set_read_only(true);
//! assert_eq!(scheduler.flush(), 1);
//! assert!(cell.has_class(READ_ONLY_CLASS));
//! ```
//!
//! # Custom sub-widgets
//!
//! Implement [`CellRenderer`] and pass it through
//! [`CellOptions::with_renderer`] to replace the editor, input area or output
//! area a cell is built with.
//!
//! # Lifecycle
//!
//! A widget starts detached. [`CellWidget::attach`] and
//! [`CellWidget::detach`] move it in and out of the render tree any number of
//! times; [`CellWidget::dispose`] ends its life. Every hook that runs is
//! reported on [`CellWidget::lifecycle`].

mod base;
mod renderer;
pub mod widgets;

pub use base::{
    CELL_CLASS, CODE_CELL_CLASS, COLLAPSED_CLASS, CellOptions, CellWidget, LifecycleHook,
    MARKDOWN_CELL_CLASS, ModelReplaced, RAW_CELL_CLASS, READ_ONLY_CLASS, RENDERED_CLASS,
};
pub use renderer::{CellRenderer, DefaultRenderer};
pub use widgets::{
    CellEditor, CodeCell, ExecuteOutcome, InputArea, InputAreaWidget, MARKDOWN_PLACEHOLDER,
    MarkdownCell, OutputArea, OutputAreaWidget, OutputContext, PlainTextEditor, RawCell,
};
