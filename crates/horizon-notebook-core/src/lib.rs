//! Core systems for Horizon Notebook.
//!
//! This crate provides the reactive foundation shared by every notebook cell
//! widget:
//!
//! - **Signal/Slot System**: Synchronous, ordered change notification
//! - **Property System**: Values that report whether an assignment changed them
//! - **Update Scheduler**: Coalesces redraw requests into one reconciliation
//!   pass per widget per frame
//! - **Logging**: Tracing targets and performance spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_notebook_core::Signal;
//!
//! let source_changed = Signal::<String>::new();
//!
//! let conn_id = source_changed.connect(|text| {
//!     println!("Source is now: {}", text);
//! });
//!
//! source_changed.emit("print('hello')".to_string());
//! source_changed.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use horizon_notebook_core::{Property, Signal};
//!
//! struct Flag {
//!     value: Property<bool>,
//!     value_changed: Signal<bool>,
//! }
//!
//! impl Flag {
//!     fn set(&self, value: bool) {
//!         if self.value.set(value) {
//!             self.value_changed.emit(value);
//!         }
//!     }
//! }
//! ```
//!
//! # Update Scheduling Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::{Arc, Weak};
//! use horizon_notebook_core::{UpdateScheduler, UpdateTarget, UpdateTargetId};
//!
//! struct Panel {
//!     id: UpdateTargetId,
//!     redraws: AtomicUsize,
//! }
//!
//! impl UpdateTarget for Panel {
//!     fn update_target_id(&self) -> UpdateTargetId { self.id }
//!     fn is_disposed(&self) -> bool { false }
//!     fn process_update(&self) { self.redraws.fetch_add(1, Ordering::SeqCst); }
//! }
//!
//! let scheduler = UpdateScheduler::new();
//! let panel = Arc::new(Panel { id: UpdateTargetId::next(), redraws: AtomicUsize::new(0) });
//! let weak: Weak<dyn UpdateTarget> = Arc::downgrade(&panel) as Weak<dyn UpdateTarget>;
//!
//! scheduler.request_update(weak.clone());
//! scheduler.request_update(weak);
//! assert_eq!(scheduler.flush(), 1);
//! assert_eq!(panel.redraws.load(Ordering::SeqCst), 1);
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod scheduler;
pub mod signal;

pub use error::{NotebookError, Result, SchedulerError};
pub use logging::PerfSpan;
pub use property::{Property, ValueChange};
pub use scheduler::{UpdateScheduler, UpdateTarget, UpdateTargetId};
pub use signal::{ConnectionContext, ConnectionGuard, ConnectionId, Signal};
