//! Output payloads produced by code execution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A set of alternative representations keyed by mime type.
pub type MimeBundle = IndexMap<String, Value>;

/// One output of a code cell, in notebook document form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum OutputPayload {
    /// Text written to a standard stream.
    Stream {
        /// `stdout` or `stderr`.
        name: String,
        /// The written text.
        text: String,
    },
    /// Rich data published by the code.
    DisplayData {
        /// The representations.
        data: MimeBundle,
        /// Per-mime-type metadata.
        #[serde(default)]
        metadata: MimeBundle,
    },
    /// The value of the last expression.
    ExecuteResult {
        /// The execution count the result belongs to.
        execution_count: Option<u32>,
        /// The representations.
        data: MimeBundle,
        /// Per-mime-type metadata.
        #[serde(default)]
        metadata: MimeBundle,
    },
    /// An exception raised by the code.
    Error {
        /// Exception name.
        ename: String,
        /// Exception value.
        evalue: String,
        /// Formatted traceback lines.
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl OutputPayload {
    /// A stream output.
    pub fn stream(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Stream {
            name: name.into(),
            text: text.into(),
        }
    }

    /// A display output holding a single `text/plain` representation.
    pub fn plain_text(text: impl Into<String>) -> Self {
        let mut data = MimeBundle::new();
        data.insert("text/plain".to_string(), Value::String(text.into()));
        Self::DisplayData {
            data,
            metadata: MimeBundle::new(),
        }
    }

    /// An execute result with the given representations.
    pub fn execute_result(execution_count: Option<u32>, data: MimeBundle) -> Self {
        Self::ExecuteResult {
            execution_count,
            data,
            metadata: MimeBundle::new(),
        }
    }

    /// An error output.
    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: Vec<String>,
    ) -> Self {
        Self::Error {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback,
        }
    }

    /// Whether this is an error output.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The notebook `output_type` tag.
    pub fn output_type(&self) -> &'static str {
        match self {
            Self::Stream { .. } => "stream",
            Self::DisplayData { .. } => "display_data",
            Self::ExecuteResult { .. } => "execute_result",
            Self::Error { .. } => "error",
        }
    }

    /// The mime bundle of display and result outputs.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Self::DisplayData { data, .. } | Self::ExecuteResult { data, .. } => Some(data),
            _ => None,
        }
    }
}
