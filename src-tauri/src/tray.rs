//! System tray controller.
//!
//! The tray reflects the last session snapshot only -- state transitions are
//! driven by server pushes and explicit refreshes, never by a local clock.
//! The action menu is recomputed from the current state on every snapshot.

use gomodoro_client::{Pomodoro, PomodoroPhase, PomodoroState, StartPomodoroInput};
use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    App, AppHandle, Manager, Runtime,
};
use tauri_plugin_global_shortcut::GlobalShortcutExt;

use crate::bridge::AppState;
use crate::notify;
use crate::window;

pub const TRAY_ID: &str = "main";

/// Start parameters used from the tray when the UI hasn't picked a task.
const DEFAULT_WORK_SEC: u32 = 1500;
const DEFAULT_BREAK_SEC: u32 = 300;
const DEFAULT_LONG_BREAK_SEC: u32 = 900;
const DEFAULT_TASK_ID: &str = "default-task";

/// Actions the tray menu can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Start,
    Pause,
    Resume,
    Stop,
    ChangeTask,
    Reset,
}

impl TrayAction {
    pub fn id(self) -> &'static str {
        match self {
            TrayAction::Start => "start",
            TrayAction::Pause => "pause",
            TrayAction::Resume => "resume",
            TrayAction::Stop => "stop",
            TrayAction::ChangeTask => "change_task",
            TrayAction::Reset => "reset",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrayAction::Start => "Start",
            TrayAction::Pause => "Pause",
            TrayAction::Resume => "Resume",
            TrayAction::Stop => "Stop",
            TrayAction::ChangeTask => "Change Task",
            TrayAction::Reset => "Reset",
        }
    }
}

/// The offered action set is a pure function of the session state.
pub fn menu_actions(state: Option<PomodoroState>) -> Vec<TrayAction> {
    match state {
        None => vec![TrayAction::Start],
        Some(PomodoroState::Active) => vec![TrayAction::Pause, TrayAction::Stop],
        Some(PomodoroState::Paused) => vec![TrayAction::Resume, TrayAction::Stop],
        Some(PomodoroState::Finished) => vec![TrayAction::ChangeTask, TrayAction::Reset],
    }
}

pub fn status_emoji(state: Option<PomodoroState>, phase: Option<PomodoroPhase>) -> &'static str {
    match state {
        None => "🍅",
        Some(PomodoroState::Paused) => "⏸️",
        Some(PomodoroState::Finished) => "✅",
        Some(PomodoroState::Active) => match phase {
            Some(PomodoroPhase::Work) => "🎯",
            Some(PomodoroPhase::ShortBreak) => "☕",
            Some(PomodoroPhase::LongBreak) => "🌴",
            None => "🍅",
        },
    }
}

pub fn format_clock(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn phase_name(phase: PomodoroPhase) -> &'static str {
    match phase {
        PomodoroPhase::Work => "WORK",
        PomodoroPhase::ShortBreak => "SHORT_BREAK",
        PomodoroPhase::LongBreak => "LONG_BREAK",
    }
}

/// Display model behind the tray icon. Holds only the last snapshot.
#[derive(Debug, Default)]
pub struct TrayModel {
    state: Option<PomodoroState>,
    phase: Option<PomodoroPhase>,
    clock: String,
    label: String,
}

impl TrayModel {
    pub fn state(&self) -> Option<PomodoroState> {
        self.state
    }

    pub fn phase(&self) -> Option<PomodoroPhase> {
        self.phase
    }

    /// Apply a snapshot and report whether this transition entered
    /// `Finished` from a non-Finished, non-null previous state. Repeated
    /// Finished snapshots return false, so the caller notifies exactly once.
    pub fn apply(&mut self, snapshot: Option<&Pomodoro>) -> bool {
        let prev = self.state;
        match snapshot {
            Some(p) => {
                self.state = Some(p.state);
                self.phase = Some(p.phase);
                self.clock = format_clock(p.remaining_time_sec);
                self.label = format!(
                    "{} #{} {}",
                    phase_name(p.phase),
                    p.phase_count,
                    self.clock
                );
            }
            None => {
                self.state = None;
                self.phase = None;
                self.clock.clear();
                self.label.clear();
            }
        }
        matches!(snapshot, Some(p) if p.state == PomodoroState::Finished)
            && prev.is_some()
            && prev != Some(PomodoroState::Finished)
    }

    pub fn title(&self) -> String {
        let emoji = status_emoji(self.state, self.phase);
        if self.clock.is_empty() {
            emoji.to_string()
        } else {
            format!("{emoji} {}", self.clock)
        }
    }

    pub fn tooltip(&self) -> String {
        if self.label.is_empty() {
            "Gomodoro".to_string()
        } else {
            format!("Gomodoro • {}", self.label)
        }
    }
}

/// Create the tray icon with its initial (idle) menu and event handlers.
pub fn setup(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let menu = build_menu(app.handle(), None)?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip("Gomodoro")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(handle_menu_event)
        .on_tray_icon_event(|tray, event| {
            // Left-click: show/focus the window
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                window::show_main_window(tray.app_handle());
            }
        });
    if let Some(icon) = app.default_window_icon().cloned() {
        builder = builder.icon(icon);
    }
    builder.build(app)?;

    Ok(())
}

fn build_menu<R: Runtime>(
    app: &AppHandle<R>,
    state: Option<PomodoroState>,
) -> tauri::Result<Menu<R>> {
    let mut items: Vec<Box<dyn tauri::menu::IsMenuItem<R>>> = Vec::new();
    items.push(Box::new(MenuItem::with_id(
        app,
        "show",
        "Show / Hide",
        true,
        None::<&str>,
    )?));

    let actions = menu_actions(state);
    if !actions.is_empty() {
        items.push(Box::new(PredefinedMenuItem::separator(app)?));
        for action in actions {
            items.push(Box::new(MenuItem::with_id(
                app,
                action.id(),
                action.label(),
                true,
                None::<&str>,
            )?));
        }
    }

    items.push(Box::new(PredefinedMenuItem::separator(app)?));
    items.push(Box::new(MenuItem::with_id(
        app,
        "quit",
        "Quit",
        true,
        None::<&str>,
    )?));

    let refs: Vec<&dyn tauri::menu::IsMenuItem<R>> =
        items.iter().map(|item| item.as_ref()).collect();
    Menu::with_items(app, &refs)
}

/// Apply a session snapshot to the tray: state machine, menu, title,
/// tooltip, and the one-shot finished notification.
pub fn sync(app: &AppHandle, snapshot: Option<&Pomodoro>) {
    let state = app.state::<AppState>();
    let (should_notify, menu_state, title, tooltip, phase) = {
        let mut model = state.tray.lock().expect("tray lock");
        let should_notify = model.apply(snapshot);
        (
            should_notify,
            model.state(),
            model.title(),
            model.tooltip(),
            model.phase(),
        )
    };

    if let Some(tray) = app.tray_by_id(TRAY_ID) {
        match build_menu(app, menu_state) {
            Ok(menu) => {
                let _ = tray.set_menu(Some(menu));
            }
            Err(e) => tracing::error!("failed to rebuild tray menu: {e}"),
        }
        let _ = tray.set_title(Some(title));
        let _ = tray.set_tooltip(Some(tooltip));
    }

    if should_notify {
        if let Some(phase) = phase {
            notify::notify_finished(app, PomodoroState::Finished, phase);
        }
    }
}

fn handle_menu_event(app: &AppHandle, event: tauri::menu::MenuEvent) {
    let id = event.id().as_ref();
    match id {
        "show" => window::toggle_main_window(app),
        "start" => {
            let state = app.state::<AppState>();
            let service = state.service.clone();
            let task_id = state
                .tasks
                .selected_task_id()
                .unwrap_or_else(|| DEFAULT_TASK_ID.to_string());
            tauri::async_runtime::spawn(async move {
                let input = StartPomodoroInput {
                    work_duration_sec: DEFAULT_WORK_SEC,
                    break_duration_sec: DEFAULT_BREAK_SEC,
                    long_break_duration_sec: DEFAULT_LONG_BREAK_SEC,
                    task_id,
                };
                if let Err(e) = service.start_pomodoro(&input).await {
                    tracing::error!("failed to start pomodoro: {e}");
                }
            });
        }
        "pause" => spawn_timer_action(app, |s| Box::pin(async move { s.pause_pomodoro().await.map(|_| ()) }), "pause"),
        "resume" => spawn_timer_action(app, |s| Box::pin(async move { s.resume_pomodoro().await.map(|_| ()) }), "resume"),
        "stop" => spawn_timer_action(app, |s| Box::pin(async move { s.stop_pomodoro().await.map(|_| ()) }), "stop"),
        "reset" => spawn_timer_action(app, |s| Box::pin(async move { s.reset_pomodoro().await.map(|_| ()) }), "reset"),
        "change_task" => window::show_main_window(app),
        "quit" => {
            let app = app.clone();
            tauri::async_runtime::spawn(async move {
                let _ = app.global_shortcut().unregister_all();
                let _ = app.remove_tray_by_id(TRAY_ID);
                let backend = app.state::<AppState>().backend.clone();
                if let Err(e) = backend.lock().await.terminate().await {
                    tracing::error!("failed to terminate backend: {e}");
                }
                app.exit(0);
            });
        }
        _ => {}
    }
}

type TimerFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<(), gomodoro_client::ServiceError>> + Send>,
>;

fn spawn_timer_action<F>(app: &AppHandle, action: F, name: &'static str)
where
    F: FnOnce(std::sync::Arc<gomodoro_client::PomodoroService>) -> TimerFuture + Send + 'static,
{
    let service = app.state::<AppState>().service.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(e) = action(service).await {
            tracing::error!("failed to {name} pomodoro: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pomodoro(state: PomodoroState, phase: PomodoroPhase, remaining: u32) -> Pomodoro {
        Pomodoro {
            id: "p1".into(),
            state,
            task_id: "t1".into(),
            phase,
            phase_count: 2,
            phase_duration_sec: 1500,
            remaining_time_sec: remaining,
            elapsed_time_sec: 1500 - remaining,
        }
    }

    #[test]
    fn test_menu_actions_table() {
        assert_eq!(menu_actions(None), vec![TrayAction::Start]);
        assert_eq!(
            menu_actions(Some(PomodoroState::Active)),
            vec![TrayAction::Pause, TrayAction::Stop]
        );
        assert_eq!(
            menu_actions(Some(PomodoroState::Paused)),
            vec![TrayAction::Resume, TrayAction::Stop]
        );
        assert_eq!(
            menu_actions(Some(PomodoroState::Finished)),
            vec![TrayAction::ChangeTask, TrayAction::Reset]
        );
    }

    #[test]
    fn test_finished_offers_no_stop() {
        assert!(!menu_actions(Some(PomodoroState::Finished)).contains(&TrayAction::Stop));
    }

    #[test]
    fn test_notify_exactly_once_per_finish_transition() {
        let mut model = TrayModel::default();
        let active = pomodoro(PomodoroState::Active, PomodoroPhase::Work, 3);
        let finished = pomodoro(PomodoroState::Finished, PomodoroPhase::Work, 0);

        assert!(!model.apply(Some(&active)));
        assert!(model.apply(Some(&finished)));
        // A repeated finished snapshot must not re-trigger.
        assert!(!model.apply(Some(&finished)));
    }

    #[test]
    fn test_no_notify_when_first_snapshot_is_finished() {
        let mut model = TrayModel::default();
        let finished = pomodoro(PomodoroState::Finished, PomodoroPhase::Work, 0);
        assert!(!model.apply(Some(&finished)));
    }

    #[test]
    fn test_apply_none_clears_display() {
        let mut model = TrayModel::default();
        model.apply(Some(&pomodoro(PomodoroState::Active, PomodoroPhase::Work, 60)));
        model.apply(None);
        assert_eq!(model.title(), "🍅");
        assert_eq!(model.tooltip(), "Gomodoro");
    }

    #[test]
    fn test_title_and_tooltip_reflect_snapshot() {
        let mut model = TrayModel::default();
        model.apply(Some(&pomodoro(PomodoroState::Active, PomodoroPhase::Work, 754)));
        assert_eq!(model.title(), "🎯 12:34");
        assert_eq!(model.tooltip(), "Gomodoro • WORK #2 12:34");
    }

    #[test]
    fn test_status_emoji_by_state_and_phase() {
        assert_eq!(status_emoji(None, None), "🍅");
        assert_eq!(status_emoji(Some(PomodoroState::Paused), Some(PomodoroPhase::Work)), "⏸️");
        assert_eq!(status_emoji(Some(PomodoroState::Finished), Some(PomodoroPhase::Work)), "✅");
        assert_eq!(
            status_emoji(Some(PomodoroState::Active), Some(PomodoroPhase::ShortBreak)),
            "☕"
        );
        assert_eq!(
            status_emoji(Some(PomodoroState::Active), Some(PomodoroPhase::LongBreak)),
            "🌴"
        );
    }

    #[test]
    fn test_format_clock_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(1500), "25:00");
    }
}
