//! Integration tests for running code cells against an execution backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use horizon_notebook::kernel::{
    ExecuteReply, ExecuteRequest, ExecutionBackend, ExecutionStatus, KernelError,
};
use horizon_notebook::NotebookSettings;
use horizon_notebook::model::{CellModel, CellType, OutputPayload};
use horizon_notebook::widget::{CellOptions, CodeCell, ExecuteOutcome, OutputArea};
use horizon_notebook_core::UpdateScheduler;
use tokio::sync::Notify;

/// Echoes the source to stdout and counts executions.
#[derive(Default)]
struct EchoBackend {
    counter: AtomicU32,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ExecutionBackend for EchoBackend {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let execution_count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ExecuteReply {
            status: ExecutionStatus::Ok,
            execution_count,
            outputs: vec![OutputPayload::stream("stdout", request.code)],
        })
    }
}

/// Holds every reply until released.
#[derive(Default)]
struct GatedBackend {
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl ExecutionBackend for GatedBackend {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ExecuteReply {
            status: ExecutionStatus::Ok,
            execution_count: 7,
            outputs: vec![OutputPayload::plain_text(request.code)],
        })
    }
}

/// Replies with a fixed status and no outputs.
struct StatusBackend(ExecutionStatus);

#[async_trait::async_trait]
impl ExecutionBackend for StatusBackend {
    async fn execute(&self, _request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
        Ok(ExecuteReply {
            status: self.0.clone(),
            execution_count: 2,
            outputs: Vec::new(),
        })
    }
}

/// Never reachable.
struct OfflineBackend;

#[async_trait::async_trait]
impl ExecutionBackend for OfflineBackend {
    async fn execute(&self, _request: ExecuteRequest) -> Result<ExecuteReply, KernelError> {
        Err(KernelError::Disconnected)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn code_cell(source: &str) -> (Arc<UpdateScheduler>, CodeCell, Arc<CellModel>) {
    init_tracing();
    let scheduler = Arc::new(UpdateScheduler::new());
    let options = CellOptions::default().with_scheduler(scheduler.clone());
    let cell = CodeCell::new(&options);
    let model = CellModel::with_source(CellType::Code, source);
    cell.set_model(Some(model.clone()));
    (scheduler, cell, model)
}

#[tokio::test]
async fn test_blank_source_is_not_sent() {
    let (_, cell, model) = code_cell("");
    let backend = EchoBackend::default();

    let outcome = cell.execute(&backend).await;

    assert_eq!(outcome, ExecuteOutcome::Skipped);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.execution_count(), None);

    model.set_source("  \n\t");
    assert_eq!(cell.execute(&backend).await, ExecuteOutcome::Skipped);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_execute_updates_count_and_outputs() {
    let (scheduler, cell, model) = code_cell("foo");
    let backend = EchoBackend::default();
    let before = model.execution_count();

    let outcome = cell.execute(&backend).await;

    assert_eq!(outcome, ExecuteOutcome::Completed { execution_count: 1 });
    assert_ne!(model.execution_count(), before);
    assert_eq!(model.execution_count(), Some(1));
    assert_eq!(cell.prompt(), "1");
    assert_eq!(cell.outputs(), vec![OutputPayload::stream("stdout", "foo")]);
    assert_eq!(scheduler.flush(), 1);
}

#[tokio::test]
async fn test_execute_replaces_previous_outputs() {
    let (_, cell, model) = code_cell("first");
    let backend = EchoBackend::default();

    cell.execute(&backend).await;
    model.set_source("second");
    let outcome = cell.execute(&backend).await;

    assert_eq!(outcome.execution_count(), Some(2));
    assert_eq!(cell.outputs(), vec![OutputPayload::stream("stdout", "second")]);
}

#[tokio::test]
async fn test_error_status_becomes_error_output() {
    let (_, cell, model) = code_cell("undefined_name");
    let backend = StatusBackend(ExecutionStatus::Error {
        ename: "NameError".to_string(),
        evalue: "name 'undefined_name' is not defined".to_string(),
        traceback: Vec::new(),
    });

    let outcome = cell.execute(&backend).await;

    assert_eq!(
        outcome,
        ExecuteOutcome::Failed {
            execution_count: Some(2)
        }
    );
    assert_eq!(model.execution_count(), Some(2));
    let outputs = cell.outputs();
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].is_error());
    assert_eq!(
        cell.output_area().rendered()[0].text,
        "NameError: name 'undefined_name' is not defined"
    );
}

#[tokio::test]
async fn test_aborted_has_no_error_output() {
    let (_, cell, _) = code_cell("loop()");
    let outcome = cell
        .execute(&StatusBackend(ExecutionStatus::Aborted))
        .await;

    assert!(!outcome.is_completed());
    assert!(cell.outputs().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_reports_error() {
    let (_, cell, model) = code_cell("1 + 1");

    let outcome = cell.execute(&OfflineBackend).await;

    assert_eq!(
        outcome,
        ExecuteOutcome::Failed {
            execution_count: None
        }
    );
    assert_eq!(model.execution_count(), None);
    assert_eq!(
        cell.outputs(),
        vec![OutputPayload::error(
            "KernelError",
            KernelError::Disconnected.to_string(),
            Vec::new()
        )]
    );
}

#[tokio::test]
async fn test_prompt_shows_busy_marker_while_running() {
    let (_, cell, _) = code_cell("sleep(1)");
    let backend = GatedBackend::default();

    let (outcome, ()) = tokio::join!(cell.execute(&backend), async {
        backend.started.notified().await;
        assert_eq!(cell.prompt(), "*");
        backend.release.notify_one();
    });

    assert!(outcome.is_completed());
    assert_eq!(cell.prompt(), "7");
}

#[tokio::test]
async fn test_dispose_while_running_drops_reply() {
    let (_, cell, model) = code_cell("long_job()");
    let backend = GatedBackend::default();

    let (outcome, ()) = tokio::join!(cell.execute(&backend), async {
        backend.started.notified().await;
        cell.dispose();
        backend.release.notify_one();
    });

    assert_eq!(outcome, ExecuteOutcome::Dropped);
    assert_eq!(model.execution_count(), None);
    assert!(cell.outputs().is_empty());
}

#[tokio::test]
async fn test_model_swap_while_running() {
    let (_, cell, original) = code_cell("job()");
    let replacement = CellModel::with_source(CellType::Code, "other");
    let backend = GatedBackend::default();

    let (outcome, ()) = tokio::join!(cell.execute(&backend), async {
        backend.started.notified().await;
        cell.set_model(Some(replacement.clone()));
        backend.release.notify_one();
    });

    assert_eq!(outcome.execution_count(), Some(7));
    assert_eq!(original.execution_count(), Some(7));
    assert_eq!(replacement.execution_count(), None);
    assert!(cell.outputs().is_empty());
    assert_eq!(cell.prompt(), "");
}

#[tokio::test]
async fn test_concurrent_cells_are_independent() {
    let (_, first, first_model) = code_cell("a");
    let (_, second, second_model) = code_cell("b");
    let backend = EchoBackend::default();

    let (a, b) = tokio::join!(first.execute(&backend), second.execute(&backend));

    assert!(a.is_completed() && b.is_completed());
    assert_ne!(first_model.execution_count(), second_model.execution_count());
    assert_eq!(first.outputs(), vec![OutputPayload::stream("stdout", "a")]);
    assert_eq!(second.outputs(), vec![OutputPayload::stream("stdout", "b")]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_overlapping_runs_of_one_cell_each_reach_backend() {
    let (_, cell, model) = code_cell("tick()");
    let backend = EchoBackend::default();

    let (a, b) = tokio::join!(cell.execute(&backend), cell.execute(&backend));

    assert!(a.is_completed() && b.is_completed());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.execution_count(), Some(2));
    assert_eq!(cell.prompt(), "2");
}

#[tokio::test]
async fn test_execute_without_model_is_dropped() {
    let options = CellOptions::default().with_scheduler(Arc::new(UpdateScheduler::new()));
    let cell = CodeCell::new(&options);
    let backend = EchoBackend::default();

    assert_eq!(cell.execute(&backend).await, ExecuteOutcome::Dropped);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shared_backend_through_arc() {
    let (_, cell, _) = code_cell("x");
    let backend: Arc<dyn ExecutionBackend> = Arc::new(EchoBackend::default());

    let outcome = cell.execute(backend.as_ref()).await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_frame_loop_reconciles_after_execute() {
    let (scheduler, cell, _) = code_cell("1");
    scheduler.flush();
    let frames = scheduler.spawn_frame_loop(NotebookSettings::default().frame_interval());

    cell.execute(&EchoBackend::default()).await;

    let reconciled = tokio::time::timeout(Duration::from_secs(2), async {
        while scheduler.has_pending() || cell.update_count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    frames.abort();

    assert!(reconciled.is_ok());
    assert!(cell.update_count() >= 2);
}
