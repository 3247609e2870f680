// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! Gomodoro Desktop Application
//!
//! A Tauri-based tray client for the gomodoro timer server. The GUI is a
//! thin skin over gomodoro-client; all timing authority stays on the server.

use tauri::{Manager, RunEvent, WindowEvent};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tracing_subscriber::EnvFilter;

mod bridge;
mod notify;
mod store;
mod tray;
mod window;

const TOGGLE_SHORTCUT: &str = "CmdOrCtrl+Shift+G";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = gomodoro_client::ClientConfig::from_env();
    if let Err(e) = config.validate() {
        tracing::error!("invalid endpoint configuration: {e}");
        std::process::exit(1);
    }
    tracing::info!(
        http = %config.http_url,
        ws = %config.ws_url,
        mode = ?config.run_mode,
        "starting gomodoro desktop"
    );

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            // A second launch focuses the running instance instead.
            window::show_main_window(app);
        }))
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_process::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, _shortcut, event| {
                    if event.state() == ShortcutState::Pressed {
                        window::toggle_main_window(app);
                    }
                })
                .build(),
        )
        .manage(bridge::AppState::new(config))
        .setup(|app| {
            #[cfg(debug_assertions)]
            {
                if let Some(window) = app.get_webview_window("main") {
                    window.open_devtools();
                }
            }
            tray::setup(app)?;
            app.global_shortcut().register(TOGGLE_SHORTCUT)?;
            bridge::spawn_startup(app.handle().clone());
            Ok(())
        })
        .on_window_event(|window, event| {
            // Closing the window hides to tray; Quit lives in the tray menu.
            if let WindowEvent::CloseRequested { api, .. } = event {
                api.prevent_close();
                let _ = window.hide();
            }
        })
        .invoke_handler(tauri::generate_handler![
            bridge::cmd_get_config,
            bridge::cmd_check_connection,
            bridge::cmd_get_current_pomodoro,
            bridge::cmd_start_pomodoro,
            bridge::cmd_pause_pomodoro,
            bridge::cmd_resume_pomodoro,
            bridge::cmd_stop_pomodoro,
            bridge::cmd_reset_pomodoro,
            bridge::cmd_list_tasks,
            bridge::cmd_create_task,
            bridge::cmd_update_task,
            bridge::cmd_delete_task,
            bridge::cmd_select_task,
            bridge::cmd_get_session_state,
            bridge::cmd_get_task_state,
        ])
        .build(tauri::generate_context!())
        .unwrap_or_else(|e| {
            eprintln!("Tauri application error: {}", e);
            std::process::exit(1);
        });

    app.run(|app, event| {
        if let RunEvent::Exit = event {
            // Best-effort teardown of the fallback backend on the way out.
            let backend = app.state::<bridge::AppState>().backend.clone();
            tauri::async_runtime::block_on(async move {
                if let Err(e) = backend.lock().await.terminate().await {
                    tracing::error!("failed to terminate fallback backend: {e}");
                }
            });
        }
    });
}
