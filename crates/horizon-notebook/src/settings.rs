//! Notebook settings.
//!
//! [`NotebookSettings`] collects the defaults cell widgets are built with.
//! Settings load from TOML or JSON; every field is optional in the file and
//! falls back to its default.
//!
//! ```toml
//! markdown_mimetype = "text/x-ipythongfm"
//! markdown_rendered = true
//! max_outputs = 200
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::CellType;

/// Errors from loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read or written.
    #[error("Failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("Invalid TOML settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML generation error.
    #[error("Failed to write TOML settings: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// JSON parsing or generation error.
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("Unsupported settings format for '{0}'")]
    UnsupportedFormat(PathBuf),

    /// A field holds a value the widgets cannot use.
    #[error("Invalid value for setting '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Defaults used when building cell widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookSettings {
    /// Editor mime type for code cells.
    pub code_mimetype: String,
    /// Editor mime type for markdown cells.
    pub markdown_mimetype: String,
    /// Editor mime type for raw cells.
    pub raw_mimetype: String,
    /// Whether new markdown cells start rendered.
    pub markdown_rendered: bool,
    /// Whether untrusted output that only offers unsafe representations is
    /// shown reduced to text rather than hidden.
    pub sanitize_untrusted_html: bool,
    /// Outputs retained per code cell; older ones are dropped. 0 keeps all.
    pub max_outputs: usize,
    /// How long the frame loop waits after the first update request of a
    /// frame before flushing, in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            code_mimetype: "text/plain".to_string(),
            markdown_mimetype: "text/x-ipythongfm".to_string(),
            raw_mimetype: "text/plain".to_string(),
            markdown_rendered: true,
            sanitize_untrusted_html: true,
            max_outputs: 0,
            frame_interval_ms: 16,
        }
    }
}

impl NotebookSettings {
    /// The default editor mime type for cells of `cell_type`.
    pub fn mimetype_for(&self, cell_type: CellType) -> &str {
        match cell_type {
            CellType::Code => &self.code_mimetype,
            CellType::Markdown => &self.markdown_mimetype,
            CellType::Raw => &self.raw_mimetype,
        }
    }

    /// The frame loop coalescing window.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frame_interval_ms)
    }

    /// Check that every field holds a usable value.
    pub fn validate(&self) -> SettingsResult<()> {
        let mimetypes = [
            ("code_mimetype", &self.code_mimetype),
            ("markdown_mimetype", &self.markdown_mimetype),
            ("raw_mimetype", &self.raw_mimetype),
        ];
        for (field, value) in mimetypes {
            if value.trim().is_empty() {
                return Err(SettingsError::InvalidValue {
                    field,
                    message: "mime type must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate TOML settings.
    pub fn from_toml_str(text: &str) -> SettingsResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate JSON settings.
    pub fn from_json_str(text: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize as TOML.
    pub fn to_toml_string(&self) -> SettingsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = match format {
            Format::Toml => Self::from_toml_str(&text)?,
            Format::Json => Self::from_json_str(&text)?,
        };
        tracing::debug!(target: "horizon_notebook::settings", path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Save settings to a `.toml` or `.json` file.
    pub fn save(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        let path = path.as_ref();
        let text = match Format::of(path)? {
            Format::Toml => self.to_toml_string()?,
            Format::Json => self.to_json_string()?,
        };
        std::fs::write(path, text).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}
