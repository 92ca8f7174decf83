//! Local credential backend: PAM password verification for the current user.
//!
//! The verification itself blocks the invoking task. That is an accepted
//! latency cost; the host loop is otherwise idle while the user is typing a
//! password.

use std::process::{Command, Stdio};

use tokio_util::sync::CancellationToken;

use crate::auth::{AuthBackend, CheckRequest};
use crate::bridge::PendingCall;
use crate::error::Error;

pub struct CredentialBackend {
    service: String,
}

impl CredentialBackend {
    pub fn new(service: &str) -> Self {
        CredentialBackend {
            service: service.to_string(),
        }
    }

    /// Run one verification session. The PAM handle closes on drop, so the
    /// session ends on every path regardless of outcome.
    fn verify(&self, username: &str, password: &str) -> crate::error::Result<bool> {
        let mut auth =
            pam::Authenticator::with_password(&self.service).map_err(|_| Error::SessionStart)?;
        auth.get_handler().set_credentials(username, password);
        // A rejected password comes back as an authentication error from PAM;
        // that is a denial, not an infrastructure failure.
        Ok(auth.authenticate().is_ok())
    }
}

impl AuthBackend for CredentialBackend {
    async fn check_support(&self) -> bool {
        // Capability probe only: can a session be initialized for the
        // configured service? No credentials are exchanged.
        pam::Authenticator::with_password(&self.service).is_ok()
    }

    async fn authenticate(
        &self,
        request: CheckRequest,
        call: PendingCall,
        _cancel: CancellationToken,
    ) {
        let username = match resolve_login_user() {
            Some(name) => name,
            None => return call.fail(Error::UserResolution),
        };

        let password = match request.credential {
            Some(password) => password,
            None => match prompt_password(&request.reason_or_action) {
                Ok(password) => password,
                Err(e) => return call.fail(e),
            },
        };

        match self.verify(&username, &password) {
            Ok(granted) => {
                if !granted {
                    tracing::debug!(user = %username, "credential verification denied");
                }
                call.succeed(granted)
            }
            Err(e) => call.fail(e),
        }
    }
}

fn resolve_login_user() -> Option<String> {
    whoami::fallible::username()
        .ok()
        .filter(|name| !name.is_empty())
}

/// Ask for the password through the graphical prompt helper.
///
/// Best-effort UX path: a missing helper is an explicit error, never a crash,
/// and a dismissed dialog maps to a cancelled check.
fn prompt_password(reason: &str) -> crate::error::Result<String> {
    if !prompt_helper_available() {
        return Err(Error::PromptHelperUnavailable);
    }

    let output = Command::new("zenity")
        .arg("--password")
        .arg(format!("--title={reason}"))
        .output()
        .map_err(|_| Error::PromptHelperUnavailable)?;

    if !output.status.success() {
        // The user closed or cancelled the dialog.
        return Err(Error::Cancelled);
    }

    let password = String::from_utf8_lossy(&output.stdout)
        .trim_end_matches('\n')
        .to_string();
    Ok(password)
}

fn prompt_helper_available() -> bool {
    Command::new("which")
        .arg("zenity")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;

    #[test]
    fn test_resolve_login_user_present_in_test_env() {
        // CI and developer machines always run as some user.
        assert!(resolve_login_user().is_some());
    }

    #[tokio::test]
    async fn test_session_init_failure_maps_to_auth_init_error() {
        // An empty service name cannot be initialized.
        let backend = CredentialBackend::new("");
        let (call, slot) = bridge::register();
        let request = CheckRequest {
            reason_or_action: "unlock".to_string(),
            credential: Some("password".to_string()),
        };
        backend
            .authenticate(request, call, CancellationToken::new())
            .await;
        match slot.outcome().await {
            // A broken service either fails to start a session or denies.
            Err(e) => assert_eq!(e.code(), "authInitError"),
            Ok(granted) => assert!(!granted),
        }
    }
}
