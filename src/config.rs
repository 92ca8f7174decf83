//! Shell configuration.
//!
//! Backend selection happens once at startup; the UI layer only sees the
//! capability set, never which backend answers it.

use std::env;

/// Which check engine answers `is_supported` / `authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// PAM password verification for the current OS user.
    Credential,
    /// polkit authorization over the system bus.
    Policy,
}

/// Subject presented to the policy authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    /// The current unix process.
    Process,
    /// The shell's own system-bus connection.
    BusConnection,
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub backend: BackendKind,
    pub subject: SubjectKind,
    /// Namespace prefix for policy action ids ("<domain>.<action>").
    pub action_domain: String,
    /// Action name used when `authenticate` is called without one.
    pub default_action: String,
    /// PAM service the credential backend initializes sessions against.
    pub pam_service: String,
    /// When set, `is_supported` also requires our action ids to be
    /// registered with the authority, not just a reachable authority.
    pub strict_support_probe: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            backend: BackendKind::Credential,
            subject: SubjectKind::Process,
            action_domain: "app.authenticator".to_string(),
            default_action: "authenticate".to_string(),
            pam_service: "login".to_string(),
            strict_support_probe: false,
        }
    }
}

impl ShellConfig {
    /// Build configuration from `AUTHENTICATOR_*` environment variables,
    /// falling back to defaults for anything unset or unrecognized.
    pub fn from_env() -> Self {
        let mut config = ShellConfig::default();

        match env::var("AUTHENTICATOR_BACKEND").as_deref() {
            Ok("policy") => config.backend = BackendKind::Policy,
            Ok("credential") => config.backend = BackendKind::Credential,
            Ok(other) => {
                tracing::warn!(backend = other, "unrecognized backend, using credential")
            }
            Err(_) => {}
        }
        match env::var("AUTHENTICATOR_SUBJECT").as_deref() {
            Ok("bus") => config.subject = SubjectKind::BusConnection,
            Ok("process") => config.subject = SubjectKind::Process,
            Ok(other) => tracing::warn!(subject = other, "unrecognized subject, using process"),
            Err(_) => {}
        }
        if let Ok(domain) = env::var("AUTHENTICATOR_ACTION_DOMAIN") {
            if !domain.is_empty() {
                config.action_domain = domain;
            }
        }
        if let Ok(action) = env::var("AUTHENTICATOR_DEFAULT_ACTION") {
            if !action.is_empty() {
                config.default_action = action;
            }
        }
        if let Ok(service) = env::var("AUTHENTICATOR_PAM_SERVICE") {
            if !service.is_empty() {
                config.pam_service = service;
            }
        }
        if let Ok(strict) = env::var("AUTHENTICATOR_STRICT_PROBE") {
            config.strict_support_probe = strict == "1" || strict == "true";
        }

        config
    }
}
