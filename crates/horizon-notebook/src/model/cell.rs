//! The cell model.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use horizon_notebook_core::{Property, Signal};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::change::{CellField, FieldValue, MetadataChange, ModelStateChange};
use super::ModelError;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`CellModel`] instance.
///
/// Two models with identical content still have different IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Executable source code.
    Code,
    /// Markdown text, shown rendered.
    Markdown,
    /// Raw text passed through untouched.
    Raw,
}

impl CellType {
    /// The name used in notebook documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
        }
    }
}

/// The mutable data behind one cell.
///
/// Every mutator compares against the current value and emits exactly one
/// signal when, and only when, something changed. Models are shared as
/// `Arc<CellModel>`; any number of widgets may display the same model.
///
/// # Example
///
/// ```
/// use horizon_notebook::model::CellModel;
///
/// let model = CellModel::code();
/// model.state_changed.connect(|change| {
///     println!("{} changed", change.field.as_str());
/// });
///
/// assert!(model.set_source("print('hi')"));
/// assert!(!model.set_source("print('hi')"));
/// ```
pub struct CellModel {
    id: ModelId,
    cell_type: CellType,
    source: Property<String>,
    trusted: Property<bool>,
    execution_count: Property<Option<u32>>,
    metadata: RwLock<IndexMap<String, Value>>,

    /// Emitted after `source`, `trusted` or the execution count changed.
    pub state_changed: Signal<ModelStateChange>,
    /// Emitted after a metadata entry was added, replaced or removed.
    pub metadata_changed: Signal<MetadataChange>,
}

impl CellModel {
    /// Create an empty model of the given kind.
    pub fn new(cell_type: CellType) -> Arc<Self> {
        Arc::new(Self::build(cell_type, String::new(), IndexMap::new(), None))
    }

    /// Create an empty code cell model.
    pub fn code() -> Arc<Self> {
        Self::new(CellType::Code)
    }

    /// Create an empty markdown cell model.
    pub fn markdown() -> Arc<Self> {
        Self::new(CellType::Markdown)
    }

    /// Create an empty raw cell model.
    pub fn raw() -> Arc<Self> {
        Self::new(CellType::Raw)
    }

    /// Create a model with initial source text.
    pub fn with_source(cell_type: CellType, source: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(cell_type, source.into(), IndexMap::new(), None))
    }

    fn build(
        cell_type: CellType,
        source: String,
        metadata: IndexMap<String, Value>,
        execution_count: Option<u32>,
    ) -> Self {
        Self {
            id: ModelId::next(),
            cell_type,
            source: Property::new(source),
            trusted: Property::new(false),
            execution_count: Property::new(execution_count),
            metadata: RwLock::new(metadata),
            state_changed: Signal::new(),
            metadata_changed: Signal::new(),
        }
    }

    /// The identity of this instance.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The kind of cell this model backs.
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// The source text.
    pub fn source(&self) -> String {
        self.source.get()
    }

    /// Whether the source is empty or whitespace only.
    pub fn is_source_blank(&self) -> bool {
        self.source.with(|source| source.trim().is_empty())
    }

    /// Whether outputs of this cell are trusted.
    pub fn trusted(&self) -> bool {
        self.trusted.get()
    }

    /// The execution counter; always `None` for non-code cells.
    pub fn execution_count(&self) -> Option<u32> {
        self.execution_count.get()
    }

    /// The metadata value stored under `name`.
    pub fn metadata(&self, name: &str) -> Option<Value> {
        self.metadata.read().get(name).cloned()
    }

    /// Metadata keys in insertion order.
    pub fn metadata_keys(&self) -> Vec<String> {
        self.metadata.read().keys().cloned().collect()
    }

    /// A copy of the whole metadata map.
    pub fn metadata_map(&self) -> IndexMap<String, Value> {
        self.metadata.read().clone()
    }

    /// Replace the source text. Returns whether it changed.
    pub fn set_source(&self, source: impl Into<String>) -> bool {
        let new_value = source.into();
        match self.source.replace(new_value.clone()) {
            Some(old_value) => {
                self.emit_state(
                    CellField::Source,
                    FieldValue::Text(old_value),
                    FieldValue::Text(new_value),
                );
                true
            }
            None => false,
        }
    }

    /// Set the trusted flag. Returns whether it changed.
    pub fn set_trusted(&self, trusted: bool) -> bool {
        if self.trusted.set(trusted) {
            self.emit_state(
                CellField::Trusted,
                FieldValue::Bool(!trusted),
                FieldValue::Bool(trusted),
            );
            true
        } else {
            false
        }
    }

    /// Set the execution counter.
    ///
    /// Only code cells carry a counter; on other kinds this returns `false`
    /// and changes nothing.
    pub fn set_execution_count(&self, count: Option<u32>) -> bool {
        if self.cell_type != CellType::Code {
            tracing::debug!(
                target: "horizon_notebook::model",
                cell_type = self.cell_type.as_str(),
                "ignoring execution count on non-code cell"
            );
            return false;
        }
        match self.execution_count.replace(count) {
            Some(old_value) => {
                self.emit_state(
                    CellField::ExecutionCount,
                    FieldValue::Count(old_value),
                    FieldValue::Count(count),
                );
                true
            }
            None => false,
        }
    }

    /// Store `value` under `name`. Returns whether the map changed.
    ///
    /// Values are not validated; consumers interpret them.
    pub fn set_metadata(&self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        let old_value = {
            let mut metadata = self.metadata.write();
            if metadata.get(&name) == Some(&value) {
                return false;
            }
            metadata.insert(name.clone(), value.clone())
        };
        self.emit_metadata(name, old_value, Some(value));
        true
    }

    /// Remove the entry under `name`. Returns whether one existed.
    pub fn remove_metadata(&self, name: &str) -> bool {
        let old_value = self.metadata.write().shift_remove(name);
        match old_value {
            Some(old_value) => {
                self.emit_metadata(name.to_string(), Some(old_value), None);
                true
            }
            None => false,
        }
    }

    fn emit_state(&self, field: CellField, old_value: FieldValue, new_value: FieldValue) {
        tracing::trace!(
            target: "horizon_notebook::model",
            model = self.id.as_u64(),
            field = field.as_str(),
            "model state changed"
        );
        self.state_changed.emit(ModelStateChange {
            model: self.id,
            field,
            old_value,
            new_value,
        });
    }

    fn emit_metadata(&self, name: String, old_value: Option<Value>, new_value: Option<Value>) {
        tracing::trace!(
            target: "horizon_notebook::model",
            model = self.id.as_u64(),
            name = %name,
            "model metadata changed"
        );
        self.metadata_changed.emit(MetadataChange {
            model: self.id,
            name,
            old_value,
            new_value,
        });
    }

    /// Serialize to a notebook document cell.
    ///
    /// The trusted flag is a property of the session, not the document, and
    /// is not written.
    pub fn to_json(&self) -> Result<Value, ModelError> {
        let record = CellRecord {
            cell_type: self.cell_type,
            source: SourceText::Single(self.source()),
            metadata: self.metadata_map(),
            execution_count: (self.cell_type == CellType::Code).then(|| self.execution_count()),
        };
        Ok(serde_json::to_value(record)?)
    }

    /// Serialize to notebook document cell JSON text.
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    /// Build a model from a notebook document cell.
    ///
    /// `source` may be a string or a list of lines, as in nbformat.
    pub fn from_json(value: Value) -> Result<Arc<Self>, ModelError> {
        let record: CellRecord = serde_json::from_value(value)?;
        let execution_count = match record.cell_type {
            CellType::Code => record.execution_count.flatten(),
            _ => None,
        };
        Ok(Arc::new(Self::build(
            record.cell_type,
            record.source.into_string(),
            record.metadata,
            execution_count,
        )))
    }

    /// Parse a notebook document cell from JSON text.
    pub fn from_json_str(text: &str) -> Result<Arc<Self>, ModelError> {
        Self::from_json(serde_json::from_str(text)?)
    }
}

impl std::fmt::Debug for CellModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellModel")
            .field("id", &self.id)
            .field("cell_type", &self.cell_type)
            .field("source", &self.source.get())
            .field("trusted", &self.trusted.get())
            .field("execution_count", &self.execution_count.get())
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct CellRecord {
    cell_type: CellType,
    #[serde(default)]
    source: SourceText,
    #[serde(default)]
    metadata: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_count: Option<Option<u32>>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SourceText {
    Single(String),
    Lines(Vec<String>),
}

impl SourceText {
    fn into_string(self) -> String {
        match self {
            Self::Single(text) => text,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for SourceText {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

static_assertions::assert_impl_all!(CellModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn record_state(model: &CellModel) -> Arc<Mutex<Vec<ModelStateChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        model.state_changed.connect(move |change| {
            seen_clone.lock().push(change.clone());
        });
        seen
    }

    #[test]
    fn test_models_have_distinct_ids() {
        assert_ne!(CellModel::code().id(), CellModel::code().id());
    }

    #[test]
    fn test_set_source_emits_once_per_change() {
        let model = CellModel::code();
        let seen = record_state(&model);

        assert!(model.set_source("foo"));
        assert!(!model.set_source("foo"));
        assert!(model.set_source("bar"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].field, CellField::Source);
        assert_eq!(seen[0].old_value, FieldValue::Text(String::new()));
        assert_eq!(seen[0].new_value, FieldValue::Text("foo".into()));
        assert_eq!(seen[1].old_value.as_text(), Some("foo"));
        assert_eq!(seen[1].model, model.id());
    }

    #[test]
    fn test_set_trusted() {
        let model = CellModel::markdown();
        let seen = record_state(&model);

        assert!(!model.set_trusted(false));
        assert!(model.set_trusted(true));
        assert!(model.trusted());

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].field, CellField::Trusted);
        assert_eq!(seen[0].old_value.as_bool(), Some(false));
        assert_eq!(seen[0].new_value.as_bool(), Some(true));
    }

    #[test]
    fn test_execution_count_only_on_code_cells() {
        let code = CellModel::code();
        assert!(code.set_execution_count(Some(1)));
        assert!(!code.set_execution_count(Some(1)));
        assert_eq!(code.execution_count(), Some(1));

        let raw = CellModel::raw();
        let seen = record_state(&raw);
        assert!(!raw.set_execution_count(Some(1)));
        assert_eq!(raw.execution_count(), None);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_metadata_changes() {
        let model = CellModel::code();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        model.metadata_changed.connect(move |change| {
            seen_clone.lock().push(change.clone());
        });

        assert!(model.set_metadata("collapsed", json!(true)));
        assert!(!model.set_metadata("collapsed", json!(true)));
        assert!(model.set_metadata("tags", json!(["a"])));
        assert!(model.remove_metadata("collapsed"));
        assert!(!model.remove_metadata("collapsed"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].name, "collapsed");
        assert_eq!(seen[0].old_value, None);
        assert_eq!(seen[0].new_value, Some(json!(true)));
        assert_eq!(seen[2].old_value, Some(json!(true)));
        assert_eq!(seen[2].new_value, None);
        assert_eq!(model.metadata_keys(), vec!["tags".to_string()]);
    }

    #[test]
    fn test_slot_may_read_model_during_emit() {
        let model = CellModel::code();
        let observed = Arc::new(Mutex::new(String::new()));
        let observed_clone = observed.clone();
        let weak = Arc::downgrade(&model);
        model.state_changed.connect(move |_| {
            if let Some(model) = weak.upgrade() {
                *observed_clone.lock() = model.source();
            }
        });

        model.set_source("x = 1");
        assert_eq!(*observed.lock(), "x = 1");
    }

    #[test]
    fn test_json_round_trip_keeps_metadata_order() {
        let model = CellModel::with_source(CellType::Code, "1 + 1");
        model.set_metadata("b", json!(1));
        model.set_metadata("a", json!(2));
        model.set_execution_count(Some(4));
        model.set_trusted(true);

        let value = model.to_json().unwrap();
        let keys: Vec<_> = value["metadata"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(value["cell_type"], json!("code"));
        assert_eq!(value["execution_count"], json!(4));
        assert!(value.get("trusted").is_none());

        let parsed = CellModel::from_json(value).unwrap();
        assert_eq!(parsed.source(), "1 + 1");
        assert_eq!(parsed.execution_count(), Some(4));
        assert_eq!(parsed.metadata_keys(), vec!["b".to_string(), "a".to_string()]);
        assert!(!parsed.trusted());
        assert_ne!(parsed.id(), model.id());
    }

    #[test]
    fn test_from_json_accepts_line_lists() {
        let model = CellModel::from_json(json!({
            "cell_type": "markdown",
            "source": ["# Title\n", "body"],
            "metadata": {}
        }))
        .unwrap();

        assert_eq!(model.cell_type(), CellType::Markdown);
        assert_eq!(model.source(), "# Title\nbody");
        assert!(model.to_json().unwrap().get("execution_count").is_none());
    }

    #[test]
    fn test_from_json_rejects_unknown_cell_type() {
        let err = CellModel::from_json_str(r#"{"cell_type": "heading", "source": ""}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_json_text_round_trip_keeps_metadata_order() {
        let model = CellModel::with_source(CellType::Raw, "raw");
        model.set_metadata("zeta", json!(true));
        model.set_metadata("alpha", json!("x"));
        model.set_metadata("mid", json!(null));

        let text = model.to_json_string().unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());

        let parsed = CellModel::from_json_str(&text).unwrap();
        assert_eq!(
            parsed.metadata_keys(),
            vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()]
        );
    }
}
