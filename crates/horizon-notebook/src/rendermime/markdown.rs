//! Markdown rendering collaborator.

use pulldown_cmark::{Event, Options, Parser, html};

use super::RenderedContent;

/// Turns markdown source into displayable content.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `source`, written in the dialect named by `mime_type`.
    ///
    /// Untrusted source must not produce raw HTML in the output.
    fn render(&self, source: &str, mime_type: &str, trusted: bool) -> RenderedContent;
}

/// CommonMark renderer producing HTML, with GitHub-style extensions.
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkRenderer {
    options: Options,
}

impl CommonMarkRenderer {
    /// Create a renderer with tables, strikethrough and task lists enabled.
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }

    /// Create a renderer with explicit parser options.
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str, _mime_type: &str, trusted: bool) -> RenderedContent {
        let mut sanitized = false;
        let parser = Parser::new_ext(source, self.options).filter(|event| {
            let raw_html = matches!(event, Event::Html(_) | Event::InlineHtml(_));
            if raw_html && !trusted {
                sanitized = true;
                return false;
            }
            true
        });

        let mut text = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut text, parser);

        RenderedContent {
            mime_type: "text/html".to_string(),
            text,
            sanitized,
        }
    }
}
