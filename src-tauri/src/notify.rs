//! Desktop notifications for phase completion.

use gomodoro_client::{PomodoroPhase, PomodoroState};
use tauri::AppHandle;
use tauri_plugin_notification::{NotificationExt, PermissionState};

/// Fire the phase-completion notification. A no-op for any state other
/// than `Finished`, so callers can pass snapshots through unconditionally.
pub fn notify_finished(app: &AppHandle, state: PomodoroState, phase: PomodoroPhase) {
    if state != PomodoroState::Finished {
        return;
    }
    if !permission_granted(app) {
        tracing::debug!("notifications unavailable, skipping finished alert");
        return;
    }
    // The notification plugin has no click callback on desktop, so clicking
    // this does not focus the window; the tray and the global shortcut are
    // the focus paths.
    let result = app
        .notification()
        .builder()
        .title("Gomodoro")
        .body(finished_body(phase))
        .show();
    if let Err(e) = result {
        tracing::warn!("failed to show notification: {e}");
    }
}

fn permission_granted(app: &AppHandle) -> bool {
    match app.notification().permission_state() {
        Ok(PermissionState::Granted) => true,
        Ok(_) => matches!(
            app.notification().request_permission(),
            Ok(PermissionState::Granted)
        ),
        Err(e) => {
            tracing::warn!("failed to query notification permission: {e}");
            false
        }
    }
}

pub fn finished_body(phase: PomodoroPhase) -> &'static str {
    match phase {
        PomodoroPhase::Work => "Work finished!",
        PomodoroPhase::ShortBreak => "Short break finished!",
        PomodoroPhase::LongBreak => "Long break finished!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_body_names_the_phase() {
        assert_eq!(finished_body(PomodoroPhase::Work), "Work finished!");
        assert_eq!(finished_body(PomodoroPhase::ShortBreak), "Short break finished!");
        assert_eq!(finished_body(PomodoroPhase::LongBreak), "Long break finished!");
    }
}
