//! Integration tests for cell widgets built from settings and custom renderers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_notebook::model::{CellModel, CellType, OutputPayload};
use horizon_notebook::widget::{
    CellEditor, CellOptions, CellRenderer, CodeCell, InputArea, MarkdownCell, OutputArea,
    PlainTextEditor, RENDERED_CLASS, RawCell,
};
use horizon_notebook::{NotebookSettings, UpdateScheduler};

fn options_with(settings: NotebookSettings) -> (Arc<UpdateScheduler>, CellOptions) {
    let scheduler = Arc::new(UpdateScheduler::new());
    let options = CellOptions::new(settings).with_scheduler(scheduler.clone());
    (scheduler, options)
}

/// Builds plain editors and counts how many it made.
#[derive(Default)]
struct CountingRenderer {
    editors: AtomicUsize,
}

impl CellRenderer for CountingRenderer {
    fn create_cell_editor(&self) -> Arc<dyn CellEditor> {
        self.editors.fetch_add(1, Ordering::SeqCst);
        let editor = PlainTextEditor::new();
        editor.set_focus_allowed(false);
        Arc::new(editor)
    }
}

#[test]
fn test_markdown_rendered_marker_follows_state() {
    let (_, options) = options_with(NotebookSettings::default());
    let cell = MarkdownCell::new(&options);
    cell.set_model(Some(CellModel::with_source(CellType::Markdown, "**bold**")));
    assert!(cell.rendered());

    cell.attach();
    assert!(cell.has_class(RENDERED_CLASS));
    assert!(!cell.input_area().is_showing_editor());

    cell.set_rendered(false);
    assert!(!cell.has_class(RENDERED_CLASS));
    assert!(cell.input_area().is_showing_editor());
}

#[test]
fn test_prompt_null_is_blank() {
    let (_, options) = options_with(NotebookSettings::default());
    let cell = CodeCell::new(&options);

    cell.set_prompt(Some("null"));
    assert_eq!(cell.prompt(), "");

    cell.set_prompt(Some("foo"));
    assert!(cell.prompt().contains("foo"));
}

#[test]
fn test_settings_drive_new_cells() {
    let settings = NotebookSettings::from_toml_str(
        r#"
        markdown_rendered = false
        max_outputs = 1
        code_mimetype = "text/x-python"
        "#,
    )
    .unwrap();
    let (_, options) = options_with(settings);

    let markdown = MarkdownCell::new(&options);
    markdown.set_model(Some(CellModel::with_source(CellType::Markdown, "# Hi")));
    markdown.attach();
    assert!(!markdown.rendered());
    assert!(!markdown.has_class(RENDERED_CLASS));

    let code = CodeCell::new(&options);
    assert_eq!(code.mimetype(), "text/x-python");
    assert_eq!(code.editor().mime_type(), "text/x-python");
    code.output_area()
        .append(OutputPayload::plain_text("1"), false);
    code.output_area()
        .append(OutputPayload::plain_text("2"), false);
    assert_eq!(code.outputs(), vec![OutputPayload::plain_text("2")]);
}

#[test]
fn test_settings_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notebook.json");
    let settings = NotebookSettings {
        markdown_rendered: false,
        ..NotebookSettings::default()
    };

    settings.save(&path).unwrap();
    let loaded = NotebookSettings::load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_custom_renderer_builds_sub_widgets() {
    let renderer = Arc::new(CountingRenderer::default());
    let scheduler = Arc::new(UpdateScheduler::new());
    let options = CellOptions::default()
        .with_scheduler(scheduler)
        .with_renderer(renderer.clone());

    let cell = RawCell::new(&options);
    let _other = CodeCell::new(&options);
    assert_eq!(renderer.editors.load(Ordering::SeqCst), 2);

    // The editor refuses focus; activating is still fine.
    cell.attach();
    cell.activate();
    assert!(!cell.editor().has_focus());
}

#[test]
fn test_one_model_shared_by_two_widgets() {
    let (scheduler, options) = options_with(NotebookSettings::default());
    let model = CellModel::with_source(CellType::Code, "x = 1");
    let left = CodeCell::new(&options);
    let right = CodeCell::new(&options);
    left.set_model(Some(model.clone()));
    right.set_model(Some(model.clone()));

    left.editor().set_text("x = 2");
    assert_eq!(right.editor().text(), "x = 2");
    assert_eq!(scheduler.flush(), 2);

    left.dispose();
    model.set_source("x = 3");
    assert_eq!(right.editor().text(), "x = 3");
    assert_eq!(left.editor().text(), "x = 2");
}

#[test]
fn test_dropping_widget_keeps_model() {
    let (scheduler, options) = options_with(NotebookSettings::default());
    let model = CellModel::with_source(CellType::Raw, "kept");
    {
        let cell = RawCell::new(&options);
        cell.set_model(Some(model.clone()));
    }

    assert_eq!(model.source(), "kept");
    assert_eq!(model.state_changed.connection_count(), 0);
    assert_eq!(scheduler.flush(), 0);
}
