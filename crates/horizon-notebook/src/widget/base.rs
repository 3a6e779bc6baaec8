//! The shared cell widget core.
//!
//! [`CellWidget`] holds everything the three cell kinds have in common: the
//! model binding, the editor and input area, read-only and mime type state,
//! class names, lifecycle hooks and scheduled reconciliation. State that
//! only one kind has lives in [`CellVariant`] and is reached through
//! [`CodeCell`](super::CodeCell), [`MarkdownCell`](super::MarkdownCell) or
//! [`RawCell`](super::RawCell).
//!
//! # Locking
//!
//! The widget's state lock is never held while emitting a signal or calling
//! into the model, editor or output area. Any of those may call back into
//! the widget synchronously.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use horizon_notebook_core::{
    ConnectionGuard, PerfSpan, Signal, UpdateScheduler, UpdateTarget, UpdateTargetId,
};
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde_json::Value;

use super::renderer::{CellRenderer, DefaultRenderer};
use super::widgets::{
    CellEditor, CodeState, InputArea, MarkdownState, OutputArea, OutputContext,
};
use crate::model::{CellField, CellModel, CellType, MetadataChange, ModelId, ModelStateChange};
use crate::rendermime::{CommonMarkRenderer, MarkdownRenderer, RenderMime, RenderedContent};
use crate::settings::NotebookSettings;

/// Class carried by every cell.
pub const CELL_CLASS: &str = "hn-Cell";
/// Class carried by code cells.
pub const CODE_CELL_CLASS: &str = "hn-CodeCell";
/// Class carried by markdown cells.
pub const MARKDOWN_CELL_CLASS: &str = "hn-MarkdownCell";
/// Class carried by raw cells.
pub const RAW_CELL_CLASS: &str = "hn-RawCell";
/// Present while the input shows rendered content instead of the editor.
pub const RENDERED_CLASS: &str = "hn-mod-rendered";
/// Present while the editor refuses edits.
pub const READ_ONLY_CLASS: &str = "hn-mod-readOnly";
/// Present while a code cell's outputs are hidden.
pub const COLLAPSED_CLASS: &str = "hn-mod-collapsed";

fn kind_class(cell_type: CellType) -> &'static str {
    match cell_type {
        CellType::Code => CODE_CELL_CLASS,
        CellType::Markdown => MARKDOWN_CELL_CLASS,
        CellType::Raw => RAW_CELL_CLASS,
    }
}

/// The collaborators and defaults a cell widget is built with.
///
/// Cloning is cheap; one `CellOptions` is typically shared by every cell of
/// a notebook.
#[derive(Clone)]
pub struct CellOptions {
    /// Builds the editor, input area and output area.
    pub renderer: Arc<dyn CellRenderer>,
    /// Coalesces update requests.
    pub scheduler: Arc<UpdateScheduler>,
    /// Renders code cell outputs.
    pub rendermime: Arc<RenderMime>,
    /// Renders markdown cell input.
    pub markdown: Arc<dyn MarkdownRenderer>,
    /// Defaults for mime types, rendering and output retention.
    pub settings: NotebookSettings,
}

impl CellOptions {
    /// Options with the built-in collaborators, the global scheduler and
    /// the given settings.
    pub fn new(settings: NotebookSettings) -> Self {
        let markdown: Arc<dyn MarkdownRenderer> = Arc::new(CommonMarkRenderer::new());
        let rendermime = RenderMime::with_markdown(markdown.clone())
            .with_sanitize_untrusted(settings.sanitize_untrusted_html);
        Self {
            renderer: Arc::new(DefaultRenderer),
            scheduler: UpdateScheduler::global(),
            rendermime: Arc::new(rendermime),
            markdown,
            settings,
        }
    }

    /// Use a different renderer strategy.
    pub fn with_renderer(mut self, renderer: Arc<dyn CellRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Use a different scheduler.
    pub fn with_scheduler(mut self, scheduler: Arc<UpdateScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Use a different output renderer registry.
    pub fn with_rendermime(mut self, rendermime: Arc<RenderMime>) -> Self {
        self.rendermime = rendermime;
        self
    }

    /// Use a different markdown renderer for markdown cells.
    pub fn with_markdown_renderer(mut self, markdown: Arc<dyn MarkdownRenderer>) -> Self {
        self.markdown = markdown;
        self
    }

    pub(crate) fn output_context(&self) -> OutputContext {
        OutputContext {
            rendermime: self.rendermime.clone(),
            max_outputs: self.settings.max_outputs,
        }
    }
}

impl Default for CellOptions {
    fn default() -> Self {
        Self::new(NotebookSettings::default())
    }
}

impl std::fmt::Debug for CellOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellOptions")
            .field("scheduler", &self.scheduler)
            .field("rendermime", &self.rendermime)
            .field("settings", &self.settings)
            .finish()
    }
}

/// A lifecycle hook run by a cell widget.
///
/// Each hook is emitted on [`CellWidget::lifecycle`] exactly when its
/// triggering condition occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleHook {
    /// The widget was attached.
    AfterAttach,
    /// The widget was activated while attached.
    ActivateRequest,
    /// A scheduled reconciliation is running.
    UpdateRequest,
    /// A metadata entry of the bound model changed.
    MetadataChanged {
        /// The metadata key.
        name: String,
    },
    /// A different model instance was bound.
    ModelChanged,
    /// A field of the bound model changed.
    ModelStateChanged {
        /// The field.
        field: CellField,
    },
}

/// Emitted by [`CellWidget::model_changed`] when the bound model instance is
/// replaced.
#[derive(Debug, Clone)]
pub struct ModelReplaced {
    /// The previously bound model.
    pub old_value: Option<Arc<CellModel>>,
    /// The newly bound model.
    pub new_value: Option<Arc<CellModel>>,
}

/// Kind-specific widget state.
pub(crate) enum CellVariant {
    Code(CodeState),
    Markdown(MarkdownState),
    Raw,
}

impl CellVariant {
    fn cell_type(&self) -> CellType {
        match self {
            Self::Code(_) => CellType::Code,
            Self::Markdown(_) => CellType::Markdown,
            Self::Raw => CellType::Raw,
        }
    }
}

struct CellState {
    model: Option<Arc<CellModel>>,
    subscriptions: Vec<ConnectionGuard>,
    mimetype: String,
    read_only: bool,
    classes: IndexSet<&'static str>,
    variant: CellVariant,
}

pub(crate) struct CellInner {
    id: UpdateTargetId,
    cell_type: CellType,
    self_ref: Weak<CellInner>,
    scheduler: Arc<UpdateScheduler>,
    input_area: Arc<dyn InputArea>,
    editor: Arc<dyn CellEditor>,
    markdown: Arc<dyn MarkdownRenderer>,
    state: Mutex<CellState>,
    editor_connection: Mutex<Option<ConnectionGuard>>,
    attached: AtomicBool,
    disposed: AtomicBool,
    update_count: AtomicUsize,
    model_changed: Signal<ModelReplaced>,
    lifecycle: Signal<LifecycleHook>,
}

/// A handle to a cell widget.
///
/// Clones share the same widget. Dropping every handle drops the widget but
/// not its model; models are only referenced.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_notebook::model::{CellModel, CellType};
/// use horizon_notebook::widget::{CellEditor, CellOptions, CellWidget};
/// use horizon_notebook_core::UpdateScheduler;
///
/// let scheduler = Arc::new(UpdateScheduler::new());
/// let options = CellOptions::default().with_scheduler(scheduler.clone());
/// let cell = CellWidget::new(CellType::Raw, &options);
///
/// let model = CellModel::raw();
/// cell.set_model(Some(model.clone()));
/// model.set_source("foo");
/// assert_eq!(cell.editor().text(), "foo");
///
/// scheduler.flush();
/// assert_eq!(cell.update_count(), 1);
/// ```
#[derive(Clone)]
pub struct CellWidget {
    inner: Arc<CellInner>,
}

impl CellWidget {
    /// Build a widget of the given kind with sub-widgets from
    /// `options.renderer`.
    pub fn new(cell_type: CellType, options: &CellOptions) -> Self {
        let variant = match cell_type {
            CellType::Code => CellVariant::Code(CodeState::new(
                options.renderer.create_output_area(options.output_context()),
            )),
            CellType::Markdown => {
                CellVariant::Markdown(MarkdownState::new(options.settings.markdown_rendered))
            }
            CellType::Raw => CellVariant::Raw,
        };
        Self::build(variant, options)
    }

    pub(crate) fn build(variant: CellVariant, options: &CellOptions) -> Self {
        let cell_type = variant.cell_type();
        let editor = options.renderer.create_cell_editor();
        let input_area = options.renderer.create_input_area(editor.clone());

        let mimetype = options.settings.mimetype_for(cell_type).to_string();
        editor.set_mime_type(&mimetype);

        let mut classes = IndexSet::new();
        classes.insert(CELL_CLASS);
        classes.insert(kind_class(cell_type));

        let inner = Arc::new_cyclic(|self_ref| CellInner {
            id: UpdateTargetId::next(),
            cell_type,
            self_ref: self_ref.clone(),
            scheduler: options.scheduler.clone(),
            input_area,
            editor: editor.clone(),
            markdown: options.markdown.clone(),
            state: Mutex::new(CellState {
                model: None,
                subscriptions: Vec::new(),
                mimetype,
                read_only: false,
                classes,
                variant,
            }),
            editor_connection: Mutex::new(None),
            attached: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            update_count: AtomicUsize::new(0),
            model_changed: Signal::new(),
            lifecycle: Signal::new(),
        });

        let weak = Arc::downgrade(&inner);
        let connection = editor.content_changed().connect_scoped(move |text| {
            if let Some(inner) = weak.upgrade() {
                inner.on_editor_changed(text);
            }
        });
        *inner.editor_connection.lock() = Some(connection);

        tracing::debug!(
            target: "horizon_notebook::widget",
            id = inner.id.as_u64(),
            cell_type = cell_type.as_str(),
            "cell widget created"
        );
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<CellInner> {
        &self.inner
    }

    /// The widget's identity, also used to coalesce its update requests.
    pub fn id(&self) -> UpdateTargetId {
        self.inner.id
    }

    /// The kind of cell.
    pub fn cell_type(&self) -> CellType {
        self.inner.cell_type
    }

    /// The bound model.
    pub fn model(&self) -> Option<Arc<CellModel>> {
        self.inner.model()
    }

    /// Bind a model, or unbind with `None`.
    ///
    /// Binding the instance that is already bound does nothing. Otherwise the
    /// widget unsubscribes from the old model, subscribes to the new one,
    /// shows its source, emits [`model_changed`](Self::model_changed) and
    /// requests one update.
    pub fn set_model(&self, model: Option<Arc<CellModel>>) {
        self.inner.set_model(model);
    }

    /// The editor mime type.
    pub fn mimetype(&self) -> String {
        self.inner.mimetype()
    }

    /// Set the editor mime type. `None` and the empty string are ignored.
    pub fn set_mimetype(&self, mimetype: Option<&str>) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }
        let Some(mimetype) = mimetype.filter(|m| !m.is_empty()) else {
            tracing::trace!(target: "horizon_notebook::widget", "ignoring empty mimetype");
            return;
        };
        {
            let mut state = inner.state.lock();
            if state.mimetype == mimetype {
                return;
            }
            state.mimetype = mimetype.to_string();
        }
        inner.editor.set_mime_type(mimetype);
        // Rendered markdown depends on the dialect.
        if matches!(inner.cell_type, CellType::Markdown) {
            inner.request_update();
        }
    }

    /// Whether the widget was explicitly made read-only.
    pub fn is_read_only(&self) -> bool {
        self.inner.state.lock().read_only
    }

    /// Make the widget read-only or editable.
    ///
    /// A change is passed to the editor and requests one update; setting the
    /// current value does nothing.
    pub fn set_read_only(&self, read_only: bool) {
        let inner = &self.inner;
        if inner.is_disposed() {
            return;
        }
        {
            let mut state = inner.state.lock();
            if state.read_only == read_only {
                return;
            }
            state.read_only = read_only;
        }
        inner.sync_editor_read_only();
        inner.request_update();
    }

    /// The bound model's trusted flag; `false` without a model.
    pub fn trusted(&self) -> bool {
        self.model().is_some_and(|model| model.trusted())
    }

    /// Set the bound model's trusted flag. Does nothing without a model.
    pub fn set_trusted(&self, trusted: bool) {
        if let Some(model) = self.model() {
            model.set_trusted(trusted);
        }
    }

    /// Show `content` in place of the editor and mark the cell rendered.
    pub fn render_input(&self, content: RenderedContent) {
        self.inner.render_input(content);
    }

    /// Show the editor again and clear the rendered mark.
    pub fn show_editor(&self) {
        self.inner.show_editor();
    }

    /// The prompt text shown next to the input.
    pub fn prompt(&self) -> String {
        self.inner.input_area.prompt()
    }

    /// Set the prompt text.
    ///
    /// `None` and the literal `"null"` both mean "no prompt".
    pub fn set_prompt(&self, prompt: Option<&str>) {
        if self.inner.is_disposed() {
            return;
        }
        let text = match prompt {
            None | Some("null") => "",
            Some(text) => text,
        };
        self.inner.input_area.set_prompt(text);
    }

    /// Focus the editor.
    ///
    /// Does nothing until the widget is attached. An editor that cannot take
    /// focus is not an error.
    pub fn activate(&self) {
        let inner = &self.inner;
        if inner.is_disposed() || !inner.is_attached() {
            tracing::trace!(
                target: "horizon_notebook::widget",
                id = inner.id.as_u64(),
                "activate ignored while detached"
            );
            return;
        }
        inner.lifecycle.emit(LifecycleHook::ActivateRequest);
        if !inner.editor.focus() {
            tracing::debug!(
                target: "horizon_notebook::widget",
                id = inner.id.as_u64(),
                "editor could not take focus"
            );
        }
    }

    /// Whether the widget is part of the render tree.
    pub fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }

    /// Add the widget to the render tree.
    ///
    /// Runs the attach hook and requests an update.
    pub fn attach(&self) {
        let inner = &self.inner;
        if inner.is_disposed() || inner.attached.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(
            target: "horizon_notebook::widget",
            id = inner.id.as_u64(),
            "cell attached"
        );
        inner.lifecycle.emit(LifecycleHook::AfterAttach);
        if matches!(inner.cell_type, CellType::Markdown) {
            inner.apply_rendered_state();
        }
        inner.request_update();
    }

    /// Remove the widget from the render tree. It may be attached again.
    ///
    /// Detaching is not teardown; use [`dispose`](Self::dispose) for that.
    pub fn detach(&self) {
        let inner = &self.inner;
        if !inner.attached.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(
            target: "horizon_notebook::widget",
            id = inner.id.as_u64(),
            "cell detached"
        );
        inner.editor.blur();
    }

    /// Request a reconciliation at the next frame.
    ///
    /// Returns `true` if no request was pending yet.
    pub fn update(&self) -> bool {
        self.inner.request_update()
    }

    /// Number of reconciliation passes run so far.
    pub fn update_count(&self) -> usize {
        self.inner.update_count.load(Ordering::SeqCst)
    }

    /// Whether the widget carries the class `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.inner.state.lock().classes.contains(name)
    }

    /// All classes, in the order they were added.
    pub fn class_names(&self) -> Vec<&'static str> {
        self.inner.state.lock().classes.iter().copied().collect()
    }

    /// The editor sub-widget.
    pub fn editor(&self) -> Arc<dyn CellEditor> {
        self.inner.editor.clone()
    }

    /// The input area sub-widget.
    pub fn input_area(&self) -> Arc<dyn InputArea> {
        self.inner.input_area.clone()
    }

    /// The scheduler this widget requests updates from.
    pub fn scheduler(&self) -> &Arc<UpdateScheduler> {
        &self.inner.scheduler
    }

    /// Emitted when a different model instance is bound.
    pub fn model_changed(&self) -> &Signal<ModelReplaced> {
        &self.inner.model_changed
    }

    /// Emitted each time a lifecycle hook runs.
    pub fn lifecycle(&self) -> &Signal<LifecycleHook> {
        &self.inner.lifecycle
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Tear the widget down.
    ///
    /// Unsubscribes from the model and editor, drops any pending update and
    /// disconnects all listeners. Every later operation is a no-op. Calling
    /// this again does nothing.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for CellWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellWidget")
            .field("id", &self.inner.id)
            .field("cell_type", &self.inner.cell_type)
            .field("attached", &self.inner.is_attached())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

static_assertions::assert_impl_all!(CellWidget: Send, Sync);

impl CellInner {
    pub(crate) fn id(&self) -> UpdateTargetId {
        self.id
    }

    pub(crate) fn model(&self) -> Option<Arc<CellModel>> {
        self.state.lock().model.clone()
    }

    pub(crate) fn mimetype(&self) -> String {
        self.state.lock().mimetype.clone()
    }

    pub(crate) fn markdown_renderer(&self) -> &Arc<dyn MarkdownRenderer> {
        &self.markdown
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Run `f` on the kind-specific state with the state lock held.
    ///
    /// `f` must not call back into the widget.
    pub(crate) fn with_variant<R>(&self, f: impl FnOnce(&mut CellVariant) -> R) -> R {
        f(&mut self.state.lock().variant)
    }

    pub(crate) fn output_area(&self) -> Option<Arc<dyn OutputArea>> {
        self.with_variant(|variant| match variant {
            CellVariant::Code(code) => Some(code.output_area.clone()),
            _ => None,
        })
    }

    fn is_current_model(&self, id: ModelId) -> bool {
        self.state
            .lock()
            .model
            .as_ref()
            .is_some_and(|model| model.id() == id)
    }

    pub(crate) fn request_update(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let target: Weak<dyn UpdateTarget> = self.self_ref.clone();
        self.scheduler.request_update(target)
    }

    pub(crate) fn set_prompt_text(&self, text: &str) {
        self.input_area.set_prompt(text);
    }

    pub(crate) fn render_input(&self, content: RenderedContent) {
        if self.is_disposed() {
            return;
        }
        self.input_area.render_input(content);
        self.state.lock().classes.insert(RENDERED_CLASS);
    }

    pub(crate) fn show_editor(&self) {
        if self.is_disposed() {
            return;
        }
        self.input_area.show_editor();
        self.state.lock().classes.shift_remove(RENDERED_CLASS);
    }

    fn set_model(&self, model: Option<Arc<CellModel>>) {
        if self.is_disposed() {
            return;
        }
        let unchanged = match (&self.state.lock().model, &model) {
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        let subscriptions = model
            .as_deref()
            .map(|model| self.subscribe(model))
            .unwrap_or_default();
        let (old_model, old_subscriptions) = {
            let mut state = self.state.lock();
            let old_subscriptions = std::mem::replace(&mut state.subscriptions, subscriptions);
            let old_model = std::mem::replace(&mut state.model, model.clone());
            (old_model, old_subscriptions)
        };
        drop(old_subscriptions);

        tracing::debug!(
            target: "horizon_notebook::widget",
            id = self.id.as_u64(),
            old = ?old_model.as_ref().map(|m| m.id()),
            new = ?model.as_ref().map(|m| m.id()),
            "model replaced"
        );

        self.lifecycle.emit(LifecycleHook::ModelChanged);
        self.sync_from_model(model.as_deref());
        self.model_changed.emit(ModelReplaced {
            old_value: old_model,
            new_value: model,
        });
        self.request_update();
    }

    /// Bring editor, prompt and kind-specific state in line with a newly
    /// bound model.
    fn sync_from_model(&self, model: Option<&CellModel>) {
        let source = model.map(CellModel::source).unwrap_or_default();
        self.editor.set_text(&source);
        self.sync_editor_read_only();

        if let Some(output_area) = self.output_area() {
            output_area.clear();
            output_area.set_trusted(model.is_some_and(CellModel::trusted));
            let collapsed = model
                .and_then(|model| model.metadata("collapsed"))
                .and_then(|value| value.as_bool())
                .unwrap_or(false);
            self.apply_collapsed(collapsed);
            self.show_execution_count(model.and_then(CellModel::execution_count));
        }
    }

    fn subscribe(&self, model: &CellModel) -> Vec<ConnectionGuard> {
        let weak = self.self_ref.clone();
        let state_guard = model.state_changed.connect_scoped(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_model_state_changed(change);
            }
        });
        let weak = self.self_ref.clone();
        let metadata_guard = model.metadata_changed.connect_scoped(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_metadata_changed(change);
            }
        });
        vec![state_guard, metadata_guard]
    }

    fn on_editor_changed(&self, text: &str) {
        if self.is_disposed() {
            return;
        }
        let model = self.model();
        if let Some(model) = model {
            model.set_source(text);
        }
    }

    fn on_model_state_changed(&self, change: &ModelStateChange) {
        if self.is_disposed() || !self.is_current_model(change.model) {
            return;
        }
        self.lifecycle.emit(LifecycleHook::ModelStateChanged {
            field: change.field,
        });

        match change.field {
            CellField::Source => {
                if let Some(text) = change.new_value.as_text() {
                    self.editor.set_text(text);
                }
            }
            CellField::Trusted => {
                if let (Some(output_area), Some(trusted)) =
                    (self.output_area(), change.new_value.as_bool())
                {
                    output_area.set_trusted(trusted);
                }
            }
            CellField::ExecutionCount => {
                if let Some(count) = change.new_value.as_count() {
                    self.show_execution_count(count);
                }
            }
        }
        self.request_update();
    }

    fn on_metadata_changed(&self, change: &MetadataChange) {
        if self.is_disposed() || !self.is_current_model(change.model) {
            return;
        }
        self.lifecycle.emit(LifecycleHook::MetadataChanged {
            name: change.name.clone(),
        });

        match change.name.as_str() {
            "editable" => self.sync_editor_read_only(),
            "collapsed" => {
                let collapsed = change
                    .new_value
                    .as_ref()
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                self.apply_collapsed(collapsed);
            }
            _ => {}
        }
        self.request_update();
    }

    /// Read-only as the editor sees it: explicit, or `editable: false` in
    /// the model metadata.
    fn effective_read_only(&self) -> bool {
        let (read_only, model) = {
            let state = self.state.lock();
            (state.read_only, state.model.clone())
        };
        read_only
            || model
                .and_then(|model| model.metadata("editable"))
                .is_some_and(|value| value == Value::Bool(false))
    }

    fn sync_editor_read_only(&self) {
        self.editor.set_read_only(self.effective_read_only());
    }

    fn reconcile_classes(&self) {
        let read_only = self.effective_read_only();
        let rendered = !self.input_area.is_showing_editor();
        let output_hidden = self.output_area().map(|area| area.is_hidden());

        let mut state = self.state.lock();
        let classes = &mut state.classes;
        let mut toggle = |class: &'static str, on: bool| {
            if on {
                classes.insert(class);
            } else {
                classes.shift_remove(class);
            }
        };
        toggle(READ_ONLY_CLASS, read_only);
        toggle(RENDERED_CLASS, rendered);
        if let Some(hidden) = output_hidden {
            toggle(COLLAPSED_CLASS, hidden);
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let (subscriptions, model) = {
            let mut state = self.state.lock();
            (std::mem::take(&mut state.subscriptions), state.model.take())
        };
        drop(subscriptions);
        let editor_connection = self.editor_connection.lock().take();
        drop(editor_connection);

        if self.scheduler.cancel(self.id).is_ok() {
            tracing::trace!(
                target: "horizon_notebook::widget",
                id = self.id.as_u64(),
                "pending update cancelled"
            );
        }

        self.editor.blur();
        self.editor.set_read_only(true);
        self.attached.store(false, Ordering::SeqCst);
        self.lifecycle.disconnect_all();
        self.model_changed.disconnect_all();

        tracing::debug!(
            target: "horizon_notebook::widget",
            id = self.id.as_u64(),
            had_model = model.is_some(),
            "cell disposed"
        );
    }
}

impl UpdateTarget for CellInner {
    fn update_target_id(&self) -> UpdateTargetId {
        self.id
    }

    fn is_disposed(&self) -> bool {
        CellInner::is_disposed(self)
    }

    fn process_update(&self) {
        if self.is_disposed() {
            return;
        }
        let _span = PerfSpan::new("cell_update");
        self.update_count.fetch_add(1, Ordering::SeqCst);
        self.lifecycle.emit(LifecycleHook::UpdateRequest);
        if self.is_disposed() {
            return;
        }

        if matches!(self.cell_type, CellType::Markdown) {
            self.refresh_rendered_markdown();
        }
        self.reconcile_classes();
    }
}
