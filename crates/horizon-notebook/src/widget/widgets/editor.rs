//! The cell editor collaborator.
//!
//! Cell widgets only need a small surface from their text editor: content
//! get/set, a read-only flag, focus handling and a "content changed"
//! notification. [`CellEditor`] captures that surface so real editors can be
//! plugged in through a [`CellRenderer`](crate::widget::CellRenderer).
//! [`PlainTextEditor`] is the built-in implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use horizon_notebook_core::{Property, Signal};

/// The text editor embedded in a cell's input area.
///
/// Implementations use interior mutability; every method takes `&self`.
pub trait CellEditor: Send + Sync {
    /// The current content.
    fn text(&self) -> String;

    /// Replace the content. Emits [`content_changed`](Self::content_changed)
    /// if the content actually changed.
    fn set_text(&self, text: &str);

    /// Whether user edits are refused.
    fn is_read_only(&self) -> bool;

    /// Set whether user edits are refused.
    fn set_read_only(&self, read_only: bool);

    /// Try to take keyboard focus. Returns `false` if the editor cannot
    /// currently accept focus.
    fn focus(&self) -> bool;

    /// Whether the editor has keyboard focus.
    fn has_focus(&self) -> bool;

    /// Give up keyboard focus.
    fn blur(&self);

    /// The mime type used for highlighting and indentation rules.
    fn mime_type(&self) -> String;

    /// Set the mime type.
    fn set_mime_type(&self, mime_type: &str);

    /// Emitted with the new content after it changed.
    fn content_changed(&self) -> &Signal<String>;
}

/// A plain text editor.
///
/// # Example
///
/// ```
/// use horizon_notebook::widget::{CellEditor, PlainTextEditor};
///
/// let editor = PlainTextEditor::new();
/// editor.content_changed().connect(|text| println!("now: {text}"));
///
/// assert!(editor.insert("x = 1"));
/// editor.set_read_only(true);
/// assert!(!editor.insert("more"));
/// assert_eq!(editor.text(), "x = 1");
/// ```
pub struct PlainTextEditor {
    text: Property<String>,
    mime_type: Property<String>,
    read_only: AtomicBool,
    focused: AtomicBool,
    focus_allowed: AtomicBool,

    /// Emitted with the new content after it changed.
    pub text_changed: Signal<String>,
    /// Emitted when focus is gained (`true`) or lost (`false`).
    pub focus_changed: Signal<bool>,
}

impl PlainTextEditor {
    /// Create an empty, editable editor.
    pub fn new() -> Self {
        Self {
            text: Property::new(String::new()),
            mime_type: Property::new("text/plain".to_string()),
            read_only: AtomicBool::new(false),
            focused: AtomicBool::new(false),
            focus_allowed: AtomicBool::new(true),
            text_changed: Signal::new(),
            focus_changed: Signal::new(),
        }
    }

    /// Append `text` as if typed by the user.
    ///
    /// Refused (returning `false`) while the editor is read-only.
    pub fn insert(&self, text: &str) -> bool {
        if self.is_read_only() {
            return false;
        }
        match self.text.update(|current| current.push_str(text)) {
            Some(change) => {
                self.text_changed.emit(change.new_value);
                true
            }
            None => false,
        }
    }

    /// Set whether the editor may take focus.
    ///
    /// An editor that is hidden or not yet realized cannot; disallowing
    /// focus also drops it.
    pub fn set_focus_allowed(&self, allowed: bool) {
        self.focus_allowed.store(allowed, Ordering::SeqCst);
        if !allowed {
            self.blur();
        }
    }

    /// Whether the editor may take focus.
    pub fn is_focus_allowed(&self) -> bool {
        self.focus_allowed.load(Ordering::SeqCst)
    }
}

impl Default for PlainTextEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CellEditor for PlainTextEditor {
    fn text(&self) -> String {
        self.text.get()
    }

    fn set_text(&self, text: &str) {
        if self.text.set(text.to_string()) {
            self.text_changed.emit(text.to_string());
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn focus(&self) -> bool {
        if !self.is_focus_allowed() {
            tracing::trace!(target: "horizon_notebook::widget", "editor refused focus");
            return false;
        }
        if !self.focused.swap(true, Ordering::SeqCst) {
            self.focus_changed.emit(true);
        }
        true
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    fn blur(&self) {
        if self.focused.swap(false, Ordering::SeqCst) {
            self.focus_changed.emit(false);
        }
    }

    fn mime_type(&self) -> String {
        self.mime_type.get()
    }

    fn set_mime_type(&self, mime_type: &str) {
        self.mime_type.set(mime_type.to_string());
    }

    fn content_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl std::fmt::Debug for PlainTextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainTextEditor")
            .field("text", &self.text.get())
            .field("read_only", &self.is_read_only())
            .field("has_focus", &self.has_focus())
            .finish()
    }
}

static_assertions::assert_impl_all!(PlainTextEditor: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_text_emits_only_on_change() {
        let editor = PlainTextEditor::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        editor.content_changed().connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        editor.set_text("a");
        editor.set_text("a");
        editor.set_text("b");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_programmatic_set_ignores_read_only() {
        let editor = PlainTextEditor::new();
        editor.set_read_only(true);
        editor.set_text("from model");
        assert_eq!(editor.text(), "from model");
        assert!(!editor.insert("typed"));
    }

    #[test]
    fn test_focus_refused_when_not_allowed() {
        let editor = PlainTextEditor::new();
        assert!(editor.focus());
        assert!(editor.has_focus());

        editor.set_focus_allowed(false);
        assert!(!editor.has_focus());
        assert!(!editor.focus());
        assert!(!editor.has_focus());
    }

    #[test]
    fn test_focus_changed_signal() {
        let editor = PlainTextEditor::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        editor.focus_changed.connect(move |&focused| seen_clone.lock().push(focused));

        editor.focus();
        editor.focus();
        editor.blur();
        editor.blur();
        assert_eq!(*seen.lock(), vec![true, false]);
    }
}
