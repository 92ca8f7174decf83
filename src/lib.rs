//! Authenticator Desktop - Tauri backend library
//!
//! Native capabilities for the authenticator desktop application:
//! - Local credential / policy authorization checks
//! - Desktop identity lookup (display name, avatar)
//! - Callback bridge for the identity SDK

mod auth;
mod bridge;
mod commands;
mod config;
mod error;
mod identity;
mod registry;
mod state;

pub use commands::*;
pub use error::Error;

use tauri::Manager;
use tracing_subscriber::EnvFilter;

/// Initialize and run the Tauri application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = state::ShellState::new(config::ShellConfig::from_env());

    tauri::Builder::default()
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            // Credential/policy checks
            commands::is_supported,
            commands::authenticate,
            // Desktop identity
            commands::get_display_name,
            commands::get_avatar_path,
            // Identity SDK bridge
            commands::auth_install,
            commands::user_changed,
            commands::app_check_activate,
        ])
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                // A closing window must not leave a check hanging forever.
                window.state::<state::ShellState>().cancel_pending();
            }
        })
        .setup(|app| {
            #[cfg(debug_assertions)]
            {
                let window = app.get_webview_window("main").unwrap();
                window.open_devtools();
            }
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
