//! Prelude module for Horizon Notebook.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use horizon_notebook::prelude::*;
//! ```
//!
//! This provides access to:
//! - Signal/slot system (`Signal`, `Property`, `ConnectionGuard`)
//! - Update scheduling (`UpdateScheduler`)
//! - Cell models (`CellModel`, `CellType`, `OutputPayload`)
//! - Cell widgets (`CodeCell`, `MarkdownCell`, `RawCell`, `CellOptions`)
//! - Execution (`ExecutionBackend`, `ExecuteRequest`, `ExecuteReply`)

// ============================================================================
// Signal/Slot and Property System
// ============================================================================

pub use horizon_notebook_core::{ConnectionGuard, ConnectionId, Property, Signal};

// ============================================================================
// Update Scheduling
// ============================================================================

pub use horizon_notebook_core::{UpdateScheduler, UpdateTarget, UpdateTargetId};

// ============================================================================
// Cell Models
// ============================================================================

pub use crate::model::{CellField, CellModel, CellType, MimeBundle, OutputPayload};

// ============================================================================
// Cell Widgets
// ============================================================================

pub use crate::widget::{
    CellOptions, CellWidget, CodeCell, ExecuteOutcome, LifecycleHook, MarkdownCell, RawCell,
};

// Sub-widget traits (needed to call editor and area methods)
pub use crate::widget::{CellEditor, CellRenderer, InputArea, OutputArea};

// ============================================================================
// Rendering
// ============================================================================

pub use crate::rendermime::{MarkdownRenderer, RenderMime, RenderedContent};

// ============================================================================
// Execution
// ============================================================================

pub use crate::kernel::{
    ExecuteReply, ExecuteRequest, ExecutionBackend, ExecutionStatus, KernelError,
};

// ============================================================================
// Settings
// ============================================================================

pub use crate::settings::NotebookSettings;
