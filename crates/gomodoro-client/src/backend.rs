//! Fallback backend process supervisor.
//!
//! When the server is unreachable at startup the app spawns the external
//! `gomodoro` binary as a child process. There is exactly one owner (the
//! application object), no restart policy, and termination is attempted
//! exactly once on shutdown regardless of how the process exited.

use tokio::process::{Child, Command};

use crate::error::BackendError;

/// Lifecycle of the supervised backend process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    NotStarted,
    Starting,
    Running,
    Stopped,
    Failed,
}

pub struct BackendProcess {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    status: BackendStatus,
    terminate_attempted: bool,
}

impl BackendProcess {
    /// Supervisor for `<program> serve`, not yet started.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["serve".into()],
            child: None,
            status: BackendStatus::NotStarted,
            terminate_attempted: false,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn status(&self) -> BackendStatus {
        self.status
    }

    /// Spawn the backend. A spawn failure moves the supervisor to `Failed`;
    /// there is no retry.
    pub fn start(&mut self) -> Result<(), BackendError> {
        self.status = BackendStatus::Starting;
        match Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => {
                tracing::info!(program = %self.program, pid = ?child.id(), "spawned fallback backend");
                self.child = Some(child);
                self.status = BackendStatus::Running;
                Ok(())
            }
            Err(source) => {
                self.status = BackendStatus::Failed;
                Err(BackendError::SpawnFailed {
                    program: self.program.clone(),
                    source,
                })
            }
        }
    }

    /// Terminate the child if one was spawned. Idempotent: only the first
    /// call acts, later calls are no-ops.
    pub async fn terminate(&mut self) -> Result<(), BackendError> {
        if self.terminate_attempted {
            return Ok(());
        }
        self.terminate_attempted = true;
        if let Some(mut child) = self.child.take() {
            tracing::info!(program = %self.program, "terminating fallback backend");
            child.kill().await.map_err(BackendError::TerminateFailed)?;
        }
        self.status = BackendStatus::Stopped;
        Ok(())
    }
}
