//! Change records carried by model signals.

use serde_json::Value;

use super::ModelId;

/// A non-keyed field of a cell model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellField {
    /// The cell's source text.
    Source,
    /// Whether outputs may be rendered with full fidelity.
    Trusted,
    /// The execution counter of a code cell.
    ExecutionCount,
}

impl CellField {
    /// The field name as used in notebook documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Trusted => "trusted",
            Self::ExecutionCount => "execution_count",
        }
    }
}

/// The value of a [`CellField`] before or after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A text value.
    Text(String),
    /// A boolean value.
    Bool(bool),
    /// An optional counter value.
    Count(Option<u32>),
}

impl FieldValue {
    /// The contained text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The contained flag, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// The contained counter, if this is a counter value.
    pub fn as_count(&self) -> Option<Option<u32>> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }
}

/// Emitted by [`CellModel::state_changed`](super::CellModel::state_changed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStateChange {
    /// The model that changed.
    pub model: ModelId,
    /// Which field changed.
    pub field: CellField,
    /// The value before the change.
    pub old_value: FieldValue,
    /// The value after the change.
    pub new_value: FieldValue,
}

/// Emitted by [`CellModel::metadata_changed`](super::CellModel::metadata_changed).
///
/// `None` means the key was absent on that side of the change.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataChange {
    /// The model that changed.
    pub model: ModelId,
    /// The metadata key.
    pub name: String,
    /// The previous value.
    pub old_value: Option<Value>,
    /// The new value.
    pub new_value: Option<Value>,
}
