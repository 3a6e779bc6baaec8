//! The output area of a code cell.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_notebook_core::Signal;
use parking_lot::Mutex;

use crate::model::OutputPayload;
use crate::rendermime::{RenderMime, RenderedContent};

/// What an output area needs from its surroundings to render outputs.
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Renders payloads into displayable content.
    pub rendermime: Arc<RenderMime>,
    /// Outputs retained; older ones are dropped. 0 keeps all.
    pub max_outputs: usize,
}

impl OutputContext {
    /// A context using `rendermime` that keeps every output.
    pub fn new(rendermime: Arc<RenderMime>) -> Self {
        Self {
            rendermime,
            max_outputs: 0,
        }
    }
}

impl Default for OutputContext {
    fn default() -> Self {
        Self::new(Arc::new(RenderMime::with_defaults()))
    }
}

/// Holds and renders the outputs of one code cell.
pub trait OutputArea: Send + Sync {
    /// Remove all outputs.
    fn clear(&self);

    /// Add an output, rendering it with the given trust.
    fn append(&self, output: OutputPayload, trusted: bool);

    /// The raw outputs, oldest first.
    fn outputs(&self) -> Vec<OutputPayload>;

    /// The rendered outputs, oldest first.
    fn rendered(&self) -> Vec<RenderedContent>;

    /// Number of outputs.
    fn len(&self) -> usize;

    /// Whether there are no outputs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-render every output with the given trust.
    fn set_trusted(&self, trusted: bool);

    /// Whether the outputs are hidden (the cell is collapsed).
    fn is_hidden(&self) -> bool;

    /// Hide or show the outputs.
    fn set_hidden(&self, hidden: bool);
}

struct OutputEntry {
    payload: OutputPayload,
    rendered: RenderedContent,
}

/// The built-in output area, rendering through a [`RenderMime`].
///
/// Consecutive stream outputs to the same stream are merged into one, the
/// way a terminal would show them.
pub struct OutputAreaWidget {
    context: OutputContext,
    entries: Mutex<Vec<OutputEntry>>,
    trusted: AtomicBool,
    hidden: AtomicBool,

    /// Emitted with the new output count after outputs were added or removed.
    pub outputs_changed: Signal<usize>,
}

impl OutputAreaWidget {
    /// Create an empty output area.
    pub fn new(context: OutputContext) -> Self {
        Self {
            context,
            entries: Mutex::new(Vec::new()),
            trusted: AtomicBool::new(false),
            hidden: AtomicBool::new(false),
            outputs_changed: Signal::new(),
        }
    }

    fn render(&self, payload: &OutputPayload, trusted: bool) -> RenderedContent {
        self.context.rendermime.render(payload, trusted)
    }
}

impl OutputArea for OutputAreaWidget {
    fn clear(&self) {
        let removed = {
            let mut entries = self.entries.lock();
            let removed = !entries.is_empty();
            entries.clear();
            removed
        };
        if removed {
            self.outputs_changed.emit(0);
        }
    }

    fn append(&self, output: OutputPayload, trusted: bool) {
        self.trusted.store(trusted, Ordering::SeqCst);
        let count = {
            let mut entries = self.entries.lock();

            let merged = match (entries.last_mut(), &output) {
                (
                    Some(OutputEntry {
                        payload:
                            OutputPayload::Stream {
                                name: last_name,
                                text: last_text,
                            },
                        rendered,
                    }),
                    OutputPayload::Stream { name, text },
                ) if last_name == name => {
                    last_text.push_str(text);
                    let merged = OutputPayload::stream(last_name.clone(), last_text.clone());
                    *rendered = self.render(&merged, trusted);
                    true
                }
                _ => false,
            };

            if !merged {
                let rendered = self.render(&output, trusted);
                entries.push(OutputEntry {
                    payload: output,
                    rendered,
                });
            }

            let max = self.context.max_outputs;
            if max > 0 && entries.len() > max {
                let excess = entries.len() - max;
                entries.drain(..excess);
            }
            entries.len()
        };
        self.outputs_changed.emit(count);
    }

    fn outputs(&self) -> Vec<OutputPayload> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.payload.clone())
            .collect()
    }

    fn rendered(&self) -> Vec<RenderedContent> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.rendered.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn set_trusted(&self, trusted: bool) {
        if self.trusted.swap(trusted, Ordering::SeqCst) == trusted {
            return;
        }
        let mut entries = self.entries.lock();
        for entry in entries.iter_mut() {
            entry.rendered = self.render(&entry.payload, trusted);
        }
    }

    fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }

    fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for OutputAreaWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputAreaWidget")
            .field("len", &self.len())
            .field("hidden", &self.is_hidden())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn html_output() -> OutputPayload {
        let mut data = crate::model::MimeBundle::new();
        data.insert("text/html".into(), json!("<b>bold</b>"));
        OutputPayload::DisplayData {
            data,
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_streams_are_merged() {
        let area = OutputAreaWidget::new(OutputContext::default());
        area.append(OutputPayload::stream("stdout", "a"), false);
        area.append(OutputPayload::stream("stdout", "b"), false);
        area.append(OutputPayload::stream("stderr", "c"), false);

        assert_eq!(area.len(), 2);
        assert_eq!(area.outputs()[0], OutputPayload::stream("stdout", "ab"));
        assert_eq!(area.rendered()[0].text, "ab");
    }

    #[test]
    fn test_max_outputs_drops_oldest() {
        let context = OutputContext {
            max_outputs: 2,
            ..OutputContext::default()
        };
        let area = OutputAreaWidget::new(context);
        for text in ["1", "2", "3"] {
            area.append(OutputPayload::plain_text(text), false);
        }

        let texts: Vec<String> = area.rendered().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["2", "3"]);
    }

    #[test]
    fn test_set_trusted_rerenders() {
        let area = OutputAreaWidget::new(OutputContext::default());
        area.append(html_output(), false);
        assert!(area.rendered()[0].sanitized);

        area.set_trusted(true);
        assert_eq!(area.rendered()[0].text, "<b>bold</b>");
        assert!(!area.rendered()[0].sanitized);
    }

    #[test]
    fn test_clear_emits_only_when_not_empty() {
        let area = OutputAreaWidget::new(OutputContext::default());
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_clone = counts.clone();
        area.outputs_changed.connect(move |&n| counts_clone.lock().push(n));

        area.clear();
        area.append(OutputPayload::plain_text("x"), false);
        area.clear();
        assert_eq!(*counts.lock(), vec![1, 0]);
        assert!(area.is_empty());
    }
}
