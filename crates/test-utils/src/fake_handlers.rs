use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::Notify;

use seedrun::exec::{TaskHandler, TaskView};
use seedrun::state::TaskKind;

/// What a fake handler saw when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedTask {
    pub kind: TaskKind,
    pub instance: Option<String>,
    pub hook: Option<String>,
}

impl ExecutedTask {
    pub fn from_view(view: &TaskView) -> Self {
        Self {
            kind: view.kind,
            instance: view
                .params
                .get("instance-name")
                .and_then(|v| v.as_str())
                .map(String::from),
            hook: view
                .params
                .get("hook")
                .and_then(|v| v.as_str())
                .map(String::from),
        }
    }
}

/// Shared execution log, in dispatch-completion order.
pub type Executed = Arc<Mutex<Vec<ExecutedTask>>>;

pub fn executed_log() -> Executed {
    Arc::new(Mutex::new(Vec::new()))
}

/// A fake handler that records which tasks were "run" and always succeeds.
pub struct RecordingHandler {
    executed: Executed,
}

impl RecordingHandler {
    pub fn new(executed: Executed) -> Self {
        Self { executed }
    }
}

impl TaskHandler for RecordingHandler {
    fn run(
        &self,
        view: TaskView,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            let mut guard = executed.lock().unwrap();
            guard.push(ExecutedTask::from_view(&view));
            Ok(())
        })
    }
}

/// A fake handler that always fails with the given message.
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TaskHandler for FailingHandler {
    fn run(
        &self,
        _view: TaskView,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let message = self.message.clone();
        Box::pin(async move { Err(anyhow!(message)) })
    }
}

/// A fake handler that signals `started` when it runs, then blocks until
/// `release` fires. Lets tests hold a task in `Doing` deterministically.
pub struct GateHandler {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl GateHandler {
    pub fn new(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self { started, release }
    }
}

impl TaskHandler for GateHandler {
    fn run(
        &self,
        _view: TaskView,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let started = Arc::clone(&self.started);
        let release = Arc::clone(&self.release);

        Box::pin(async move {
            started.notify_one();
            release.notified().await;
            Ok(())
        })
    }
}
