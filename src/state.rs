//! Shared shell state managed by the Tauri runtime.
//!
//! Everything mutable sits behind a mutex because the host dispatches
//! commands from its async runtime, not from a single UI thread.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::auth::Backend;
use crate::config::ShellConfig;
use crate::registry::{CallbackRegistry, SdkRegistry};

/// Attestation provider for the app-integrity SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationProvider {
    /// Debug provider carrying the supplied debug token.
    Debug(String),
    /// Platform attestation.
    Platform,
}

pub struct ShellState {
    pub config: ShellConfig,
    pub backend: Backend,
    pub registry: Mutex<CallbackRegistry>,
    pub sdk: Mutex<SdkRegistry>,
    attestation: Mutex<Option<AttestationProvider>>,
    cancel: Mutex<CancellationToken>,
}

impl ShellState {
    pub fn new(config: ShellConfig) -> Self {
        let backend = Backend::from_config(&config);
        ShellState {
            config,
            backend,
            registry: Mutex::new(CallbackRegistry::default()),
            sdk: Mutex::new(SdkRegistry::default()),
            attestation: Mutex::new(None),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Token for a new in-flight check. Replaces the previous token without
    /// firing it; only one check is ever in flight from the single UI.
    pub fn issue_cancel_token(&self) -> CancellationToken {
        let mut guard = self.cancel.lock();
        *guard = CancellationToken::new();
        (*guard).clone()
    }

    /// Cancel whatever check is currently in flight, if any.
    pub fn cancel_pending(&self) {
        self.cancel.lock().cancel();
    }

    /// Register the callback registry's functions with the named SDK app.
    pub fn install_sdk(&self, app_name: &str) -> bool {
        self.sdk.lock().install(app_name);
        tracing::debug!(app = app_name, "identity SDK callbacks installed");
        true
    }

    /// Record the new current user and fan the change out to listeners.
    pub fn notify_user_changed(&self, user_uid: Option<String>) -> bool {
        let mut registry = self.registry.lock();
        registry.set_current_user_uid(user_uid);
        registry.notify_all();
        true
    }

    /// Select the attestation provider for the app-integrity SDK.
    pub fn activate_attestation(&self, debug_token: Option<String>) -> bool {
        let provider = match debug_token {
            Some(token) => AttestationProvider::Debug(token),
            None => AttestationProvider::Platform,
        };
        *self.attestation.lock() = Some(provider);
        true
    }

    pub fn attestation_provider(&self) -> Option<AttestationProvider> {
        self.attestation.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static FIRED: RefCell<Vec<Option<String>>> = RefCell::new(Vec::new());
    }

    fn recording_listener(uid: Option<&str>, _context: usize) {
        FIRED.with(|fired| fired.borrow_mut().push(uid.map(str::to_owned)));
    }

    fn take_fired() -> Vec<Option<String>> {
        FIRED.with(|fired| fired.borrow_mut().drain(..).collect())
    }

    fn state() -> ShellState {
        ShellState::new(ShellConfig::default())
    }

    #[test]
    fn test_install_then_user_change_notifies_and_updates_uid() {
        take_fired();
        let state = state();
        assert!(state.install_sdk("myapp"));
        assert!(state.sdk.lock().is_installed("myapp"));
        assert_eq!(state.sdk.lock().table("myapp").unwrap().slot_count(), 4);

        state.registry.lock().add_listener(recording_listener, 0);
        assert!(state.notify_user_changed(Some("u1".to_string())));

        assert_eq!(take_fired(), vec![Some("u1".to_string())]);
        assert_eq!(state.registry.lock().current_user_uid(), Some("u1"));
    }

    #[test]
    fn test_sign_out_notifies_with_no_uid() {
        take_fired();
        let state = state();
        state.registry.lock().add_listener(recording_listener, 0);
        state.notify_user_changed(Some("u1".to_string()));
        state.notify_user_changed(None);
        assert_eq!(take_fired(), vec![Some("u1".to_string()), None]);
        assert_eq!(state.registry.lock().current_user_uid(), None);
    }

    #[test]
    fn test_attestation_provider_selection() {
        let state = state();
        assert_eq!(state.attestation_provider(), None);
        assert!(state.activate_attestation(Some("token".to_string())));
        assert_eq!(
            state.attestation_provider(),
            Some(AttestationProvider::Debug("token".to_string()))
        );
        assert!(state.activate_attestation(None));
        assert_eq!(
            state.attestation_provider(),
            Some(AttestationProvider::Platform)
        );
    }

    #[test]
    fn test_new_cancel_token_does_not_fire_previous() {
        let state = state();
        let first = state.issue_cancel_token();
        let second = state.issue_cancel_token();
        assert!(!first.is_cancelled());
        state.cancel_pending();
        assert!(!first.is_cancelled());
        assert!(second.is_cancelled());
    }
}
