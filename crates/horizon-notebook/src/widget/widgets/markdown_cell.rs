//! Markdown cells: shown either as source in the editor or rendered.

use std::ops::Deref;

use crate::widget::base::{CellInner, CellOptions, CellVariant, CellWidget};

/// Rendered in place of an empty markdown cell.
pub const MARKDOWN_PLACEHOLDER: &str = "*Type Markdown and LaTeX:* $ \\alpha^2 $";

/// Markdown-cell-specific widget state.
pub(crate) struct MarkdownState {
    rendered: bool,
    rendered_from: Option<RenderInputs>,
}

/// Everything a markdown rendering depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RenderInputs {
    source: String,
    trusted: bool,
    mimetype: String,
}

impl MarkdownState {
    pub(crate) fn new(rendered: bool) -> Self {
        Self {
            rendered,
            rendered_from: None,
        }
    }
}

/// A markdown cell widget.
///
/// While [`rendered`](Self::rendered) the input area shows the model source
/// rendered through the configured
/// [`MarkdownRenderer`](crate::rendermime::MarkdownRenderer); otherwise it
/// shows the editor. Dereferences to [`CellWidget`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_notebook::model::{CellModel, CellType};
/// use horizon_notebook::widget::{CellOptions, InputArea, MarkdownCell, RENDERED_CLASS};
/// use horizon_notebook_core::UpdateScheduler;
///
/// let options = CellOptions::default().with_scheduler(Arc::new(UpdateScheduler::new()));
/// let cell = MarkdownCell::new(&options);
/// cell.set_model(Some(CellModel::with_source(CellType::Markdown, "# Notes")));
///
/// cell.attach();
/// assert!(cell.has_class(RENDERED_CLASS));
///
/// cell.set_rendered(false);
/// assert!(!cell.has_class(RENDERED_CLASS));
/// assert!(cell.input_area().is_showing_editor());
/// ```
#[derive(Clone, Debug)]
pub struct MarkdownCell {
    widget: CellWidget,
}

impl MarkdownCell {
    /// Create a markdown cell, rendered or not per
    /// [`NotebookSettings::markdown_rendered`](crate::NotebookSettings::markdown_rendered).
    pub fn new(options: &CellOptions) -> Self {
        let state = MarkdownState::new(options.settings.markdown_rendered);
        Self {
            widget: CellWidget::build(CellVariant::Markdown(state), options),
        }
    }

    /// View a generic cell widget as a markdown cell.
    ///
    /// Gives the widget back if it is not a markdown cell.
    pub fn from_widget(widget: CellWidget) -> Result<Self, CellWidget> {
        let is_markdown = widget
            .inner()
            .with_variant(|variant| matches!(variant, CellVariant::Markdown(_)));
        if is_markdown {
            Ok(Self { widget })
        } else {
            Err(widget)
        }
    }

    /// The generic widget handle.
    pub fn widget(&self) -> &CellWidget {
        &self.widget
    }

    /// Whether the cell shows rendered markdown rather than the editor.
    pub fn rendered(&self) -> bool {
        self.widget.inner().with_variant(|variant| match variant {
            CellVariant::Markdown(markdown) => markdown.rendered,
            _ => false,
        })
    }

    /// Switch between rendered and editing mode.
    ///
    /// A change takes effect immediately and requests one update; setting
    /// the current value does nothing.
    pub fn set_rendered(&self, rendered: bool) {
        let inner = self.widget.inner();
        if inner.is_disposed() {
            return;
        }
        let changed = inner.with_variant(|variant| match variant {
            CellVariant::Markdown(markdown) if markdown.rendered != rendered => {
                markdown.rendered = rendered;
                true
            }
            _ => false,
        });
        if !changed {
            return;
        }
        tracing::debug!(
            target: "horizon_notebook::widget",
            id = inner.id().as_u64(),
            rendered,
            "markdown rendered state changed"
        );
        inner.apply_rendered_state();
        inner.request_update();
    }
}

impl Deref for MarkdownCell {
    type Target = CellWidget;

    fn deref(&self) -> &CellWidget {
        &self.widget
    }
}

impl From<MarkdownCell> for CellWidget {
    fn from(cell: MarkdownCell) -> Self {
        cell.widget
    }
}

impl CellInner {
    /// Show rendered markdown or the editor, whichever the state asks for.
    pub(crate) fn apply_rendered_state(&self) {
        let rendered = self.with_variant(|variant| match variant {
            CellVariant::Markdown(markdown) => {
                if !markdown.rendered {
                    markdown.rendered_from = None;
                }
                Some(markdown.rendered)
            }
            _ => None,
        });
        match rendered {
            Some(true) => self.render_markdown(self.markdown_source()),
            Some(false) => self.show_editor(),
            None => {}
        }
    }

    /// Re-render if the source, trust or mimetype changed since the last
    /// rendering.
    pub(crate) fn refresh_rendered_markdown(&self) {
        let current = self.markdown_source();
        let stale = self.with_variant(|variant| match variant {
            CellVariant::Markdown(markdown) => {
                markdown.rendered && markdown.rendered_from.as_ref() != Some(&current)
            }
            _ => false,
        });
        if stale {
            self.render_markdown(current);
        }
    }

    fn markdown_source(&self) -> RenderInputs {
        let (source, trusted) = self
            .model()
            .map(|model| (model.source(), model.trusted()))
            .unwrap_or_default();
        RenderInputs {
            source,
            trusted,
            mimetype: self.mimetype(),
        }
    }

    fn render_markdown(&self, inputs: RenderInputs) {
        let text = if inputs.source.trim().is_empty() {
            MARKDOWN_PLACEHOLDER
        } else {
            inputs.source.as_str()
        };
        let content = self
            .markdown_renderer()
            .render(text, &inputs.mimetype, inputs.trusted);

        self.with_variant(|variant| {
            if let CellVariant::Markdown(markdown) = variant {
                markdown.rendered_from = Some(inputs.clone());
            }
        });
        self.render_input(content);
    }
}
