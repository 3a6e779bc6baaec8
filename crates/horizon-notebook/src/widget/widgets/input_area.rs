//! The input area: prompt plus either the editor or rendered content.

use std::sync::Arc;

use horizon_notebook_core::Property;
use parking_lot::RwLock;

use super::editor::CellEditor;
use crate::rendermime::RenderedContent;

/// The container that shows a cell's prompt and input.
///
/// The input is either the live editor or a rendered stand-in supplied by
/// the owning cell (for example rendered markdown).
pub trait InputArea: Send + Sync {
    /// The editor shown when the input is not rendered.
    fn editor(&self) -> &Arc<dyn CellEditor>;

    /// The prompt label text.
    fn prompt(&self) -> String;

    /// Set the prompt label text verbatim.
    fn set_prompt(&self, prompt: &str);

    /// Hide the editor and show `content` in its place.
    fn render_input(&self, content: RenderedContent);

    /// Show the editor again, discarding rendered content.
    fn show_editor(&self);

    /// The rendered content currently shown, if any.
    fn rendered_content(&self) -> Option<RenderedContent>;

    /// Whether the editor is the visible input.
    fn is_showing_editor(&self) -> bool {
        self.rendered_content().is_none()
    }
}

/// The built-in input area.
pub struct InputAreaWidget {
    editor: Arc<dyn CellEditor>,
    prompt: Property<String>,
    rendered: RwLock<Option<RenderedContent>>,
}

impl InputAreaWidget {
    /// Create an input area around `editor`, showing the editor.
    pub fn new(editor: Arc<dyn CellEditor>) -> Self {
        Self {
            editor,
            prompt: Property::new(String::new()),
            rendered: RwLock::new(None),
        }
    }
}

impl InputArea for InputAreaWidget {
    fn editor(&self) -> &Arc<dyn CellEditor> {
        &self.editor
    }

    fn prompt(&self) -> String {
        self.prompt.get()
    }

    fn set_prompt(&self, prompt: &str) {
        self.prompt.set(prompt.to_string());
    }

    fn render_input(&self, content: RenderedContent) {
        self.editor.blur();
        *self.rendered.write() = Some(content);
    }

    fn show_editor(&self) {
        self.rendered.write().take();
    }

    fn rendered_content(&self) -> Option<RenderedContent> {
        self.rendered.read().clone()
    }
}

impl std::fmt::Debug for InputAreaWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputAreaWidget")
            .field("prompt", &self.prompt.get())
            .field("showing_editor", &self.is_showing_editor())
            .finish()
    }
}
