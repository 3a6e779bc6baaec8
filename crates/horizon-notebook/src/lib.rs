//! Horizon Notebook - reactive notebook cell widgets.
//!
//! This is the main crate; it re-exports the reactive primitives from
//! `horizon-notebook-core` alongside the cell models and widgets built on
//! them.
//!
//! - [`model`]: the shared cell document state and its change signals
//! - [`widget`]: code, markdown and raw cell widgets
//! - [`rendermime`]: output and markdown rendering
//! - [`kernel`]: the execution backend interface code cells run against
//! - [`settings`]: defaults loaded from TOML or JSON
//!
//! # Example
//!
//! ```no_run
//! use horizon_notebook::prelude::*;
//!
//! async fn run(backend: &dyn ExecutionBackend) {
//!     let cell = CodeCell::new(&CellOptions::default());
//!     cell.set_model(Some(CellModel::with_source(CellType::Code, "1 + 1")));
//!     cell.attach();
//!
//!     match cell.execute(backend).await {
//!         ExecuteOutcome::Completed { execution_count } => {
//!             println!("[{execution_count}] {} outputs", cell.outputs().len());
//!         }
//!         other => println!("not completed: {other:?}"),
//!     }
//! }
//! ```

pub use horizon_notebook_core::*;

pub mod kernel;
pub mod model;
pub mod prelude;
pub mod rendermime;
pub mod settings;
pub mod widget;

pub use settings::{NotebookSettings, SettingsError, SettingsResult};
