//! Raw cells: text passed through untouched.

use std::ops::Deref;

use crate::model::CellType;
use crate::widget::base::{CellOptions, CellWidget};

/// A raw cell widget. It has no state beyond [`CellWidget`]'s.
#[derive(Clone, Debug)]
pub struct RawCell {
    widget: CellWidget,
}

impl RawCell {
    /// Create a raw cell.
    pub fn new(options: &CellOptions) -> Self {
        Self {
            widget: CellWidget::new(CellType::Raw, options),
        }
    }

    /// View a generic cell widget as a raw cell.
    ///
    /// Gives the widget back if it is not a raw cell.
    pub fn from_widget(widget: CellWidget) -> Result<Self, CellWidget> {
        if widget.cell_type() == CellType::Raw {
            Ok(Self { widget })
        } else {
            Err(widget)
        }
    }

    /// The generic widget handle.
    pub fn widget(&self) -> &CellWidget {
        &self.widget
    }
}

impl Deref for RawCell {
    type Target = CellWidget;

    fn deref(&self) -> &CellWidget {
        &self.widget
    }
}

impl From<RawCell> for CellWidget {
    fn from(cell: RawCell) -> Self {
        cell.widget
    }
}
