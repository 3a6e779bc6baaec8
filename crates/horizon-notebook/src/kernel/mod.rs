//! The execution backend collaborator.
//!
//! Code cells hand their source to an [`ExecutionBackend`] and render what
//! comes back. The backend owns the wire protocol; this module only fixes
//! the request and reply shapes.
//!
//! # Example
//!
//! ```
//! use horizon_notebook::kernel::{
//!     ExecuteReply, ExecuteRequest, ExecutionBackend, ExecutionStatus, KernelError,
//! };
//! use horizon_notebook::model::OutputPayload;
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl ExecutionBackend for Echo {
//!     async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
//!         Ok(ExecuteReply {
//!             status: ExecutionStatus::Ok,
//!             execution_count: 1,
//!             outputs: vec![OutputPayload::stream("stdout", request.code)],
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::OutputPayload;

/// A request to run a piece of code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// The source to run.
    pub code: String,
    /// Run without broadcasting outputs or incrementing the counter.
    #[serde(default)]
    pub silent: bool,
    /// Record the code in the backend's input history.
    #[serde(default = "default_store_history")]
    pub store_history: bool,
}

fn default_store_history() -> bool {
    true
}

impl ExecuteRequest {
    /// A normal, history-recording request for `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            silent: false,
            store_history: true,
        }
    }
}

/// How an execution ended on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The code ran to completion.
    Ok,
    /// The code raised.
    Error {
        /// Exception name.
        ename: String,
        /// Exception value.
        evalue: String,
        /// Formatted traceback lines.
        #[serde(default)]
        traceback: Vec<String>,
    },
    /// The backend refused to run the code, typically because an earlier
    /// request in the same batch failed.
    Aborted,
}

impl ExecutionStatus {
    /// Whether the code ran to completion.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// The backend's answer to an [`ExecuteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteReply {
    /// How the execution ended.
    #[serde(flatten)]
    pub status: ExecutionStatus,
    /// The counter value assigned to this execution.
    pub execution_count: u32,
    /// Outputs produced while running, in order.
    #[serde(default)]
    pub outputs: Vec<OutputPayload>,
}

/// A failure to talk to the backend at all.
///
/// Errors raised *by the executed code* are not `KernelError`s; they arrive
/// as [`ExecutionStatus::Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The backend is not reachable.
    #[error("Kernel is disconnected")]
    Disconnected,
    /// No reply arrived in time.
    #[error("Kernel did not reply within {0:?}")]
    Timeout(Duration),
    /// The reply could not be understood.
    #[error("Kernel protocol error: {0}")]
    Protocol(String),
}

/// Runs code on behalf of code cells.
#[async_trait::async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Run `request` and wait for its reply.
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReply, KernelError>;
}

#[async_trait::async_trait]
impl<T: ExecutionBackend + ?Sized> ExecutionBackend for Arc<T> {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
        (**self).execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_wire_shape() {
        let reply = ExecuteReply {
            status: ExecutionStatus::Error {
                ename: "ValueError".into(),
                evalue: "bad".into(),
                traceback: vec![],
            },
            execution_count: 7,
            outputs: vec![],
        };

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["status"], json!("error"));
        assert_eq!(value["ename"], json!("ValueError"));
        assert_eq!(value["execution_count"], json!(7));

        let parsed: ExecuteReply = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, reply);
    }

    #[test]
    fn test_request_defaults() {
        let request: ExecuteRequest = serde_json::from_value(json!({"code": "1"})).unwrap();
        assert_eq!(request, ExecuteRequest::new("1"));
    }

    #[test]
    fn test_kernel_error_display() {
        assert_eq!(
            KernelError::Timeout(Duration::from_secs(2)).to_string(),
            "Kernel did not reply within 2s"
        );
        assert_eq!(
            KernelError::Protocol("bad frame".into()).to_string(),
            "Kernel protocol error: bad frame"
        );
    }
}
