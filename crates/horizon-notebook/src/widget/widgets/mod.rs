//! Concrete cell widgets and their sub-widgets.
//!
//! - [`CodeCell`], [`MarkdownCell`], [`RawCell`]: the three cell kinds
//! - [`CellEditor`] / [`PlainTextEditor`]: the text editor
//! - [`InputArea`] / [`InputAreaWidget`]: prompt plus editor or rendered input
//! - [`OutputArea`] / [`OutputAreaWidget`]: code cell outputs

mod code_cell;
mod editor;
mod input_area;
mod markdown_cell;
mod output_area;
mod raw_cell;

pub use code_cell::{CodeCell, ExecuteOutcome};
pub use editor::{CellEditor, PlainTextEditor};
pub use input_area::{InputArea, InputAreaWidget};
pub use markdown_cell::{MARKDOWN_PLACEHOLDER, MarkdownCell};
pub use output_area::{OutputArea, OutputAreaWidget, OutputContext};
pub use raw_cell::RawCell;

pub(crate) use code_cell::CodeState;
pub(crate) use markdown_cell::MarkdownState;
