//! UI-facing state stores.
//!
//! The webview is a pure renderer; everything it displays comes from these
//! two stores, updated by bridge commands and push events. State is
//! in-memory only and rebuilt from the server on every process start.

use std::sync::Mutex;

use gomodoro_client::{Pomodoro, Task};
use serde::Serialize;

/// Known server error for "no timer yet" -- an expected steady state on
/// first run, suppressed during the initial load.
const NO_CURRENT_POMODORO: &str = "no current pomodoro";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub pomodoro: Option<Pomodoro>,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(skip)]
    initial_load_done: bool,
}

/// Timer session store: initial fetch, imperative actions, push snapshots.
#[derive(Default)]
pub struct SessionStore(Mutex<SessionState>);

impl SessionStore {
    pub fn begin_load(&self) {
        let mut state = self.0.lock().expect("session lock");
        state.loading = true;
        state.error = None;
    }

    /// Record the outcome of a current-session fetch. The "no current
    /// pomodoro" error is swallowed on the first load only.
    pub fn finish_load(&self, result: Result<Option<Pomodoro>, String>) {
        let mut state = self.0.lock().expect("session lock");
        state.loading = false;
        match result {
            Ok(pomodoro) => state.pomodoro = pomodoro,
            Err(message) => {
                let suppress =
                    !state.initial_load_done && message.contains(NO_CURRENT_POMODORO);
                if !suppress {
                    state.error = Some(message);
                }
            }
        }
        state.initial_load_done = true;
    }

    /// Adopt the snapshot returned by a start/pause/resume/stop action.
    pub fn adopt(&self, pomodoro: Pomodoro) {
        let mut state = self.0.lock().expect("session lock");
        state.loading = false;
        state.error = None;
        state.pomodoro = Some(pomodoro);
    }

    /// Overwrite the snapshot from a push event. The server is the sole
    /// timing authority; nothing decrements locally between pushes.
    pub fn apply_event(&self, pomodoro: Pomodoro) {
        let mut state = self.0.lock().expect("session lock");
        state.pomodoro = Some(pomodoro);
    }

    pub fn record_error(&self, message: String) {
        let mut state = self.0.lock().expect("session lock");
        state.loading = false;
        state.error = Some(message);
    }

    pub fn snapshot(&self) -> SessionState {
        self.0.lock().expect("session lock").clone()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub selected_task_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Task list store: every mutation is followed by a full list refresh.
#[derive(Default)]
pub struct TaskStore(Mutex<TaskState>);

impl TaskStore {
    pub fn begin_load(&self) {
        let mut state = self.0.lock().expect("task lock");
        state.loading = true;
        state.error = None;
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        let mut state = self.0.lock().expect("task lock");
        state.loading = false;
        state.tasks = tasks;
    }

    pub fn record_error(&self, message: String) {
        let mut state = self.0.lock().expect("task lock");
        state.loading = false;
        state.error = Some(message);
    }

    pub fn select(&self, task_id: Option<String>) {
        self.0.lock().expect("task lock").selected_task_id = task_id;
    }

    pub fn selected_task_id(&self) -> Option<String> {
        self.0.lock().expect("task lock").selected_task_id.clone()
    }

    /// Deleting the selected task clears the selection.
    pub fn task_deleted(&self, task_id: &str) {
        let mut state = self.0.lock().expect("task lock");
        if state.selected_task_id.as_deref() == Some(task_id) {
            state.selected_task_id = None;
        }
    }

    pub fn snapshot(&self) -> TaskState {
        self.0.lock().expect("task lock").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gomodoro_client::{PomodoroPhase, PomodoroState};

    fn pomodoro(state: PomodoroState) -> Pomodoro {
        Pomodoro {
            id: "p1".into(),
            state,
            task_id: "t1".into(),
            phase: PomodoroPhase::Work,
            phase_count: 1,
            phase_duration_sec: 1500,
            remaining_time_sec: 1200,
            elapsed_time_sec: 300,
        }
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            title: format!("task {id}"),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_no_current_pomodoro_suppressed_on_initial_load_only() {
        let store = SessionStore::default();
        store.begin_load();
        store.finish_load(Err("GraphQL error: no current pomodoro".into()));
        assert!(store.snapshot().error.is_none());

        // Same failure after the initial load is user-visible.
        store.begin_load();
        store.finish_load(Err("GraphQL error: no current pomodoro".into()));
        assert!(store.snapshot().error.is_some());
    }

    #[test]
    fn test_other_initial_load_errors_surface() {
        let store = SessionStore::default();
        store.begin_load();
        store.finish_load(Err("HTTP status 502".into()));
        assert_eq!(store.snapshot().error.as_deref(), Some("HTTP status 502"));
    }

    #[test]
    fn test_adopt_clears_error_and_loading() {
        let store = SessionStore::default();
        store.record_error("boom".into());
        store.adopt(pomodoro(PomodoroState::Active));
        let state = store.snapshot();
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert_eq!(
            state.pomodoro.unwrap().state,
            PomodoroState::Active
        );
    }

    #[test]
    fn test_push_event_overwrites_snapshot() {
        let store = SessionStore::default();
        store.adopt(pomodoro(PomodoroState::Active));
        let mut next = pomodoro(PomodoroState::Active);
        next.remaining_time_sec = 1199;
        store.apply_event(next);
        assert_eq!(store.snapshot().pomodoro.unwrap().remaining_time_sec, 1199);
    }

    #[test]
    fn test_deleting_selected_task_clears_selection() {
        let store = TaskStore::default();
        store.set_tasks(vec![task("t1"), task("t2")]);
        store.select(Some("t1".into()));
        store.task_deleted("t1");
        assert!(store.selected_task_id().is_none());
    }

    #[test]
    fn test_deleting_other_task_keeps_selection() {
        let store = TaskStore::default();
        store.select(Some("t1".into()));
        store.task_deleted("t2");
        assert_eq!(store.selected_task_id().as_deref(), Some("t1"));
    }
}
