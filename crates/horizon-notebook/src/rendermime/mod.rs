//! Output rendering collaborators.
//!
//! [`RenderMime`] turns [`OutputPayload`]s into [`RenderedContent`] by
//! picking the richest representation a registered [`MimeRenderer`] can
//! display. Renderers declare whether they are safe for untrusted output;
//! untrusted bundles never reach an unsafe renderer and fall back to the
//! next representation instead.
//!
//! # Example
//!
//! ```
//! use horizon_notebook::model::OutputPayload;
//! use horizon_notebook::rendermime::RenderMime;
//!
//! let rendermime = RenderMime::with_defaults();
//! let rendered = rendermime.render(&OutputPayload::stream("stdout", "hi\n"), false);
//! assert_eq!(rendered.text, "hi\n");
//! ```

mod markdown;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::model::{MimeBundle, OutputPayload};

pub use markdown::{CommonMarkRenderer, MarkdownRenderer};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("HTML tag pattern is valid"));

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ANSI escape pattern is valid"));

/// Displayable content produced by a renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContent {
    /// The mime type of `text`.
    pub mime_type: String,
    /// The rendered text or markup.
    pub text: String,
    /// Whether content was removed or downgraded because it was untrusted.
    pub sanitized: bool,
}

impl RenderedContent {
    /// Plain text content.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            text: text.into(),
            sanitized: false,
        }
    }
}

/// Renders one or more mime types.
pub trait MimeRenderer: Send + Sync {
    /// The mime types this renderer accepts.
    fn mime_types(&self) -> &[&'static str];

    /// Whether the renderer may be given untrusted data.
    fn is_safe(&self) -> bool;

    /// Render `value`, which was stored under `mime_type`.
    fn render(&self, mime_type: &str, value: &Value, trusted: bool) -> RenderedContent;
}

/// Concatenate a notebook multiline string (a string or a list of strings).
pub fn multiline_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(lines) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .concat(),
        other => other.to_string(),
    }
}

/// Strip terminal color codes, as found in tracebacks.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// `text/plain`.
#[derive(Debug, Default)]
pub struct PlainTextRenderer;

impl MimeRenderer for PlainTextRenderer {
    fn mime_types(&self) -> &[&'static str] {
        &["text/plain"]
    }

    fn is_safe(&self) -> bool {
        true
    }

    fn render(&self, _mime_type: &str, value: &Value, _trusted: bool) -> RenderedContent {
        RenderedContent::plain(strip_ansi(&multiline_text(value)))
    }
}

/// `text/html`. Unsafe: untrusted HTML is reduced to its text.
#[derive(Debug, Default)]
pub struct HtmlRenderer;

impl MimeRenderer for HtmlRenderer {
    fn mime_types(&self) -> &[&'static str] {
        &["text/html"]
    }

    fn is_safe(&self) -> bool {
        false
    }

    fn render(&self, _mime_type: &str, value: &Value, trusted: bool) -> RenderedContent {
        let text = multiline_text(value);
        if trusted {
            return RenderedContent {
                mime_type: "text/html".to_string(),
                text,
                sanitized: false,
            };
        }
        RenderedContent {
            mime_type: "text/plain".to_string(),
            text: HTML_TAG.replace_all(&text, "").into_owned(),
            sanitized: true,
        }
    }
}

/// `text/markdown`, delegating to a [`MarkdownRenderer`].
pub struct MarkdownMimeRenderer {
    markdown: Arc<dyn MarkdownRenderer>,
}

impl MarkdownMimeRenderer {
    /// Wrap a markdown renderer.
    pub fn new(markdown: Arc<dyn MarkdownRenderer>) -> Self {
        Self { markdown }
    }
}

impl MimeRenderer for MarkdownMimeRenderer {
    fn mime_types(&self) -> &[&'static str] {
        &["text/markdown"]
    }

    fn is_safe(&self) -> bool {
        true
    }

    fn render(&self, mime_type: &str, value: &Value, trusted: bool) -> RenderedContent {
        self.markdown.render(&multiline_text(value), mime_type, trusted)
    }
}

/// `image/png`, shown as an inline image reference.
#[derive(Debug, Default)]
pub struct ImageRenderer;

impl MimeRenderer for ImageRenderer {
    fn mime_types(&self) -> &[&'static str] {
        &["image/png"]
    }

    fn is_safe(&self) -> bool {
        true
    }

    fn render(&self, mime_type: &str, value: &Value, _trusted: bool) -> RenderedContent {
        let data: String = multiline_text(value)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        RenderedContent {
            mime_type: "text/html".to_string(),
            text: format!("<img src=\"data:{mime_type};base64,{data}\">"),
            sanitized: false,
        }
    }
}

/// `application/json`, pretty-printed.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl MimeRenderer for JsonRenderer {
    fn mime_types(&self) -> &[&'static str] {
        &["application/json"]
    }

    fn is_safe(&self) -> bool {
        true
    }

    fn render(&self, _mime_type: &str, value: &Value, _trusted: bool) -> RenderedContent {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        RenderedContent {
            mime_type: "application/json".to_string(),
            text,
            sanitized: false,
        }
    }
}

/// An ordered registry of mime renderers.
///
/// Registration order is preference order: for a bundle offering several
/// representations, the first renderer that accepts one of them wins.
pub struct RenderMime {
    renderers: Vec<Arc<dyn MimeRenderer>>,
    sanitize_untrusted: bool,
}

impl RenderMime {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            renderers: Vec::new(),
            sanitize_untrusted: true,
        }
    }

    /// Create a registry with the built-in renderers, using
    /// [`CommonMarkRenderer`] for markdown.
    pub fn with_defaults() -> Self {
        Self::with_markdown(Arc::new(CommonMarkRenderer::new()))
    }

    /// Create a registry with the built-in renderers and a custom markdown
    /// renderer.
    pub fn with_markdown(markdown: Arc<dyn MarkdownRenderer>) -> Self {
        let mut rendermime = Self::new();
        rendermime.add_renderer(Arc::new(HtmlRenderer));
        rendermime.add_renderer(Arc::new(MarkdownMimeRenderer::new(markdown)));
        rendermime.add_renderer(Arc::new(ImageRenderer));
        rendermime.add_renderer(Arc::new(JsonRenderer));
        rendermime.add_renderer(Arc::new(PlainTextRenderer));
        rendermime
    }

    /// Set whether untrusted bundles that only offer unsafe representations
    /// are shown reduced (the default) or hidden.
    pub fn set_sanitize_untrusted(&mut self, sanitize: bool) {
        self.sanitize_untrusted = sanitize;
    }

    /// Builder form of [`set_sanitize_untrusted`](Self::set_sanitize_untrusted).
    pub fn with_sanitize_untrusted(mut self, sanitize: bool) -> Self {
        self.sanitize_untrusted = sanitize;
        self
    }

    /// Append a renderer with the lowest preference.
    pub fn add_renderer(&mut self, renderer: Arc<dyn MimeRenderer>) {
        self.renderers.push(renderer);
    }

    /// Insert a renderer with the highest preference.
    pub fn prepend_renderer(&mut self, renderer: Arc<dyn MimeRenderer>) {
        self.renderers.insert(0, renderer);
    }

    /// All accepted mime types in preference order.
    pub fn mime_types(&self) -> Vec<&'static str> {
        self.renderers
            .iter()
            .flat_map(|renderer| renderer.mime_types().iter().copied())
            .collect()
    }

    fn find(
        &self,
        bundle: &MimeBundle,
        safe_only: bool,
    ) -> Option<(&'static str, &Arc<dyn MimeRenderer>)> {
        self.renderers
            .iter()
            .filter(|renderer| !safe_only || renderer.is_safe())
            .find_map(|renderer| {
                renderer
                    .mime_types()
                    .iter()
                    .find(|mime_type| bundle.contains_key(**mime_type))
                    .map(|mime_type| (*mime_type, renderer))
            })
    }

    /// The representation of `bundle` that would be rendered.
    pub fn preferred_mime_type(&self, bundle: &MimeBundle, trusted: bool) -> Option<&'static str> {
        self.find(bundle, !trusted).map(|(mime_type, _)| mime_type)
    }

    /// Render one output payload.
    pub fn render(&self, payload: &OutputPayload, trusted: bool) -> RenderedContent {
        match payload {
            OutputPayload::Stream { text, .. } => RenderedContent::plain(strip_ansi(text)),
            OutputPayload::Error {
                ename,
                evalue,
                traceback,
            } => {
                let text = if traceback.is_empty() {
                    format!("{ename}: {evalue}")
                } else {
                    strip_ansi(&traceback.join("\n"))
                };
                RenderedContent::plain(text)
            }
            OutputPayload::DisplayData { data, .. } | OutputPayload::ExecuteResult { data, .. } => {
                self.render_bundle(data, trusted)
            }
        }
    }

    /// Render the preferred representation of a mime bundle.
    pub fn render_bundle(&self, bundle: &MimeBundle, trusted: bool) -> RenderedContent {
        if let Some((mime_type, renderer)) = self.find(bundle, !trusted) {
            return renderer.render(mime_type, &bundle[mime_type], trusted);
        }

        if !trusted {
            if let Some((mime_type, renderer)) = self.find(bundle, false) {
                tracing::debug!(
                    target: "horizon_notebook::rendermime",
                    mime_type,
                    sanitize = self.sanitize_untrusted,
                    "untrusted output only offers unsafe representations"
                );
                if self.sanitize_untrusted {
                    return renderer.render(mime_type, &bundle[mime_type], false);
                }
                return RenderedContent {
                    mime_type: "text/plain".to_string(),
                    text: String::new(),
                    sanitized: true,
                };
            }
        }

        let offered: Vec<&str> = bundle.keys().map(String::as_str).collect();
        tracing::debug!(
            target: "horizon_notebook::rendermime",
            ?offered,
            "no renderer for output"
        );
        RenderedContent::plain(format!("No renderer for: {}", offered.join(", ")))
    }
}

impl Default for RenderMime {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for RenderMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderMime")
            .field("mime_types", &self.mime_types())
            .field("sanitize_untrusted", &self.sanitize_untrusted)
            .finish()
    }
}
