//! Cell models and the data they carry.
//!
//! A [`CellModel`] is the view-independent state of one notebook cell: its
//! source text, trusted flag, metadata map and (for code cells) execution
//! counter. Widgets subscribe to the model's signals to stay in sync:
//!
//! - [`CellModel::state_changed`] carries a [`ModelStateChange`] for the
//!   non-keyed fields
//! - [`CellModel::metadata_changed`] carries a [`MetadataChange`] for keyed
//!   metadata entries
//!
//! Execution results travel as [`OutputPayload`]s, which are owned by the
//! code cell's output area rather than the model.

mod cell;
mod change;
mod output;

pub use cell::{CellModel, CellType, ModelId};
pub use change::{CellField, FieldValue, MetadataChange, ModelStateChange};
pub use output::{MimeBundle, OutputPayload};

/// Errors from reading notebook document cells.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The cell JSON did not match the notebook cell schema.
    #[error("Invalid notebook cell: {0}")]
    Json(#[from] serde_json::Error),
}
