//! IPC bridge between the webview and the client library.
//!
//! Every command resolves to a uniform envelope instead of a rejected
//! promise, so the renderer always gets a structured `{ success, .. }`
//! object. Error details (the debug representation) are attached only in
//! development builds.

use std::sync::{Arc, Mutex as StdMutex};

use gomodoro_client::{
    BackendProcess, ClientConfig, GraphqlClient, Pomodoro, PomodoroService, RunMode,
    StartPomodoroInput, Subscription, Task,
};
use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager};
use tokio::sync::Mutex;

use crate::store::{SessionState, SessionStore, TaskState, TaskStore};
use crate::tray::{self, TrayModel};

/// Event channel the renderer listens on for pushed timer snapshots.
pub const EVENT_CHANNEL: &str = "pomodoro:event";
pub const SUBSCRIPTION_ERROR_CHANNEL: &str = "pomodoro:subscription-error";

/// Connection attempts before falling back to a local backend process, and
/// after spawning one.
const PROBE_ATTEMPTS: u32 = 2;
const POST_SPAWN_ATTEMPTS: u32 = 5;

pub struct AppState {
    pub config: ClientConfig,
    pub client: Arc<GraphqlClient>,
    pub service: Arc<PomodoroService>,
    pub backend: Arc<Mutex<BackendProcess>>,
    pub session: SessionStore,
    pub tasks: TaskStore,
    pub tray: StdMutex<TrayModel>,
    event_subscription: StdMutex<Option<Subscription>>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        let client = Arc::new(GraphqlClient::new(&config));
        let service = Arc::new(PomodoroService::new(client.clone()));
        let backend = Arc::new(Mutex::new(BackendProcess::new(&config.backend_bin)));
        Self {
            config,
            client,
            service,
            backend,
            session: SessionStore::default(),
            tasks: TaskStore::default(),
            tray: StdMutex::new(TrayModel::default()),
            event_subscription: StdMutex::new(None),
        }
    }

    fn dev(&self) -> bool {
        self.config.run_mode.is_development()
    }
}

#[derive(Debug, Serialize)]
pub struct IpcError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IpcResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IpcError>,
}

impl<T> IpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err<E: std::fmt::Display + std::fmt::Debug>(error: &E, dev: bool) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(IpcError {
                message: error.to_string(),
                stack: dev.then(|| format!("{error:?}")),
            }),
        }
    }

    pub fn err_message(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(IpcError {
                message: message.into(),
                stack: None,
            }),
        }
    }
}

// ── Config and connectivity ─────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInfo {
    pub env: RunMode,
    pub http_url: String,
    pub ws_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub is_connected: bool,
}

#[tauri::command]
pub fn cmd_get_config(app: AppHandle) -> IpcResponse<ConfigInfo> {
    let state = app.state::<AppState>();
    IpcResponse::ok(ConfigInfo {
        env: state.config.run_mode,
        http_url: state.config.http_url.clone(),
        ws_url: state.config.ws_url.clone(),
    })
}

#[tauri::command]
pub async fn cmd_check_connection(app: AppHandle) -> IpcResponse<ConnectionStatus> {
    let state = app.state::<AppState>();
    let is_connected = state.client.health_check().await;
    IpcResponse::ok(ConnectionStatus { is_connected })
}

// ── Timer commands ──────────────────────────────────────────────────

#[tauri::command]
pub async fn cmd_get_current_pomodoro(app: AppHandle) -> IpcResponse<Option<Pomodoro>> {
    let state = app.state::<AppState>();
    state.session.begin_load();
    match state.service.current_pomodoro().await {
        Ok(pomodoro) => {
            state.session.finish_load(Ok(pomodoro.clone()));
            sync_tray(&app, pomodoro.clone());
            IpcResponse::ok(pomodoro)
        }
        Err(e) => {
            state.session.finish_load(Err(e.to_string()));
            IpcResponse::err(&e, state.dev())
        }
    }
}

#[tauri::command]
pub async fn cmd_start_pomodoro(app: AppHandle, input: StartPomodoroInput) -> IpcResponse<Pomodoro> {
    if input.task_id.is_empty() {
        return IpcResponse::err_message("no task selected");
    }
    let state = app.state::<AppState>();
    let result = state.service.start_pomodoro(&input).await;
    adopt_timer_result(&app, result)
}

#[tauri::command]
pub async fn cmd_pause_pomodoro(app: AppHandle) -> IpcResponse<Pomodoro> {
    let state = app.state::<AppState>();
    let result = state.service.pause_pomodoro().await;
    adopt_timer_result(&app, result)
}

#[tauri::command]
pub async fn cmd_resume_pomodoro(app: AppHandle) -> IpcResponse<Pomodoro> {
    let state = app.state::<AppState>();
    let result = state.service.resume_pomodoro().await;
    adopt_timer_result(&app, result)
}

#[tauri::command]
pub async fn cmd_stop_pomodoro(app: AppHandle) -> IpcResponse<Pomodoro> {
    let state = app.state::<AppState>();
    let result = state.service.stop_pomodoro().await;
    adopt_timer_result(&app, result)
}

#[tauri::command]
pub async fn cmd_reset_pomodoro(app: AppHandle) -> IpcResponse<Pomodoro> {
    let state = app.state::<AppState>();
    let result = state.service.reset_pomodoro().await;
    adopt_timer_result(&app, result)
}

/// Every successful timer action updates the session store, broadcasts the
/// snapshot, and refreshes the tray before replying to the caller.
fn adopt_timer_result(
    app: &AppHandle,
    result: Result<Pomodoro, gomodoro_client::ServiceError>,
) -> IpcResponse<Pomodoro> {
    let state = app.state::<AppState>();
    match result {
        Ok(pomodoro) => {
            state.session.adopt(pomodoro.clone());
            broadcast(app, &pomodoro);
            sync_tray(app, Some(pomodoro.clone()));
            IpcResponse::ok(pomodoro)
        }
        Err(e) => {
            state.session.record_error(e.to_string());
            IpcResponse::err(&e, state.dev())
        }
    }
}

// ── Task commands ───────────────────────────────────────────────────

#[tauri::command]
pub async fn cmd_list_tasks(app: AppHandle) -> IpcResponse<Vec<Task>> {
    let state = app.state::<AppState>();
    state.tasks.begin_load();
    match state.service.list_tasks().await {
        Ok(tasks) => {
            state.tasks.set_tasks(tasks.clone());
            IpcResponse::ok(tasks)
        }
        Err(e) => {
            state.tasks.record_error(e.to_string());
            IpcResponse::err(&e, state.dev())
        }
    }
}

#[tauri::command]
pub async fn cmd_create_task(app: AppHandle, title: String) -> IpcResponse<Task> {
    if title.trim().is_empty() {
        return IpcResponse::err_message("task title must not be empty");
    }
    let state = app.state::<AppState>();
    match state.service.create_task(&title).await {
        Ok(task) => {
            refresh_tasks(&state).await;
            IpcResponse::ok(task)
        }
        Err(e) => IpcResponse::err(&e, state.dev()),
    }
}

#[tauri::command]
pub async fn cmd_update_task(app: AppHandle, task_id: String, title: String) -> IpcResponse<Task> {
    if title.trim().is_empty() {
        return IpcResponse::err_message("task title must not be empty");
    }
    let state = app.state::<AppState>();
    match state.service.update_task(&task_id, &title).await {
        Ok(task) => {
            refresh_tasks(&state).await;
            IpcResponse::ok(task)
        }
        Err(e) => IpcResponse::err(&e, state.dev()),
    }
}

#[tauri::command]
pub async fn cmd_delete_task(app: AppHandle, task_id: String) -> IpcResponse<bool> {
    let state = app.state::<AppState>();
    match state.service.delete_task(&task_id).await {
        Ok(deleted) => {
            if deleted {
                state.tasks.task_deleted(&task_id);
            }
            refresh_tasks(&state).await;
            IpcResponse::ok(deleted)
        }
        Err(e) => IpcResponse::err(&e, state.dev()),
    }
}

#[tauri::command]
pub fn cmd_select_task(app: AppHandle, task_id: Option<String>) -> IpcResponse<()> {
    let state = app.state::<AppState>();
    state.tasks.select(task_id);
    IpcResponse::ok(())
}

async fn refresh_tasks(state: &AppState) {
    match state.service.list_tasks().await {
        Ok(tasks) => state.tasks.set_tasks(tasks),
        Err(e) => state.tasks.record_error(e.to_string()),
    }
}

// ── Store snapshots ─────────────────────────────────────────────────

#[tauri::command]
pub fn cmd_get_session_state(app: AppHandle) -> IpcResponse<SessionState> {
    IpcResponse::ok(app.state::<AppState>().session.snapshot())
}

#[tauri::command]
pub fn cmd_get_task_state(app: AppHandle) -> IpcResponse<TaskState> {
    IpcResponse::ok(app.state::<AppState>().tasks.snapshot())
}

// ── Startup and push events ─────────────────────────────────────────

fn broadcast(app: &AppHandle, pomodoro: &Pomodoro) {
    if let Err(e) = app.emit(EVENT_CHANNEL, pomodoro) {
        tracing::warn!("failed to broadcast pomodoro event: {e}");
    }
}

/// Tray mutations must run on the main thread.
fn sync_tray(app: &AppHandle, snapshot: Option<Pomodoro>) {
    let handle = app.clone();
    let result = app.run_on_main_thread(move || tray::sync(&handle, snapshot.as_ref()));
    if let Err(e) = result {
        tracing::warn!("failed to dispatch tray sync: {e}");
    }
}

/// Establish connectivity, spawning the fallback backend if the first probe
/// fails, then prime the stores and open the event subscription.
pub fn spawn_startup(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let state = app.state::<AppState>();

        let mut connected = state.client.reconnect_with_backoff(PROBE_ATTEMPTS).await;
        if !connected {
            tracing::info!("server unreachable, spawning fallback backend");
            if let Err(e) = state.backend.lock().await.start() {
                tracing::error!("failed to spawn fallback backend: {e}");
            }
            connected = state.client.reconnect_with_backoff(POST_SPAWN_ATTEMPTS).await;
        }
        if !connected {
            let message = format!("could not reach server at {}", state.config.http_url);
            tracing::error!("{message}");
            state.session.record_error(message);
            return;
        }
        tracing::info!(url = %state.config.http_url, "connected to gomodoro server");

        state.session.begin_load();
        match state.service.current_pomodoro().await {
            Ok(pomodoro) => {
                state.session.finish_load(Ok(pomodoro.clone()));
                sync_tray(&app, pomodoro);
            }
            Err(e) => state.session.finish_load(Err(e.to_string())),
        }

        state.tasks.begin_load();
        match state.service.list_tasks().await {
            Ok(tasks) => state.tasks.set_tasks(tasks),
            Err(e) => state.tasks.record_error(e.to_string()),
        }

        start_event_pump(&app).await;
    });
}

/// One subscription for the process lifetime. Incoming snapshots fan out to
/// the session store, the renderer channel, and the tray.
async fn start_event_pump(app: &AppHandle) {
    let event_app = app.clone();
    let error_app = app.clone();
    let state = app.state::<AppState>();
    let result = state
        .service
        .subscribe_pomodoro_events(
            move |pomodoro| {
                let state = event_app.state::<AppState>();
                state.session.apply_event(pomodoro.clone());
                broadcast(&event_app, &pomodoro);
                sync_tray(&event_app, Some(pomodoro));
            },
            move |message| {
                tracing::error!("pomodoro subscription error: {message}");
                if let Err(e) = error_app.emit(SUBSCRIPTION_ERROR_CHANNEL, &message) {
                    tracing::warn!("failed to broadcast subscription error: {e}");
                }
            },
        )
        .await;
    match result {
        Ok(subscription) => {
            *state
                .event_subscription
                .lock()
                .expect("subscription lock") = Some(subscription);
        }
        Err(e) => tracing::error!("failed to subscribe to pomodoro events: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let value = serde_json::to_value(IpcResponse::ok(5)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], 5);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_hides_stack_in_production() {
        let err = gomodoro_client::ServiceError::NullPomodoro { operation: "pause" };
        let value = serde_json::to_value(IpcResponse::<()>::err(&err, false)).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("pause"));
        assert!(value["error"].get("stack").is_none());
    }

    #[test]
    fn test_error_envelope_includes_stack_in_development() {
        let err = gomodoro_client::ServiceError::NullPomodoro { operation: "stop" };
        let value = serde_json::to_value(IpcResponse::<()>::err(&err, true)).unwrap();
        assert!(value["error"]["stack"].as_str().unwrap().contains("NullPomodoro"));
    }

    #[test]
    fn test_empty_title_rejected_locally() {
        let response = IpcResponse::<Task>::err_message("task title must not be empty");
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("data").is_none());
    }
}
