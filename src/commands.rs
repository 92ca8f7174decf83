//! Tauri commands for IPC between frontend and backend
//!
//! Each command is a thin wrapper over the check engine, identity adapter, or
//! registry; everything that can be tested without the host lives elsewhere.

use tauri::{command, State};

use crate::auth::{AuthBackend, CheckRequest};
use crate::bridge;
use crate::error::Result;
use crate::identity;
use crate::state::ShellState;

// ============================================================================
// Credential/policy checks
// ============================================================================

/// Whether the configured check backend is usable at all. Never an error.
#[command]
pub async fn is_supported(state: State<'_, ShellState>) -> Result<bool> {
    Ok(state.backend.check_support().await)
}

/// Run one authentication/authorization check.
///
/// `reason` is the prompt reason (credential backend) or action name (policy
/// backend); `password` short-circuits the interactive prompt. A denial is
/// `Ok(false)`; only infrastructure failures are errors.
#[command]
pub async fn authenticate(
    state: State<'_, ShellState>,
    reason: Option<String>,
    password: Option<String>,
) -> Result<bool> {
    let request = CheckRequest {
        reason_or_action: reason.unwrap_or_else(|| state.config.default_action.clone()),
        credential: password,
    };

    let (call, slot) = bridge::register();
    let cancel = state.issue_cancel_token();
    state.backend.authenticate(request, call, cancel).await;
    slot.outcome().await
}

// ============================================================================
// Desktop identity
// ============================================================================

/// Display name of the current OS user, `"Unknown"` on any lookup failure.
#[command]
pub async fn get_display_name() -> String {
    identity::display_name().await
}

/// Avatar path for the current OS user; the file may not exist.
#[command]
pub async fn get_avatar_path() -> String {
    identity::avatar_path()
}

// ============================================================================
// Identity SDK bridge
// ============================================================================

/// Register the callback registry's four functions with the named SDK app.
#[command]
pub async fn auth_install(state: State<'_, ShellState>, app_name: String) -> Result<bool> {
    Ok(state.install_sdk(&app_name))
}

/// The UI layer reports a sign-in change; update the uid and notify listeners.
#[command]
pub async fn user_changed(
    state: State<'_, ShellState>,
    user_uid: Option<String>,
) -> Result<bool> {
    Ok(state.notify_user_changed(user_uid))
}

/// Select the debug or platform attestation provider for the app-integrity
/// SDK.
#[command]
pub async fn app_check_activate(
    state: State<'_, ShellState>,
    debug_token: Option<String>,
) -> Result<bool> {
    Ok(state.activate_attestation(debug_token))
}
