//! Credential/policy check engine.
//!
//! One capability surface, {check_support, authenticate}, with the concrete
//! backend chosen once at startup. Callers never learn which backend
//! answered; they only see a bool or an error code.

#[cfg(target_os = "linux")]
pub mod credential;
#[cfg(target_os = "linux")]
pub mod policy;

use tokio_util::sync::CancellationToken;

use crate::bridge::PendingCall;
use crate::config::ShellConfig;
#[cfg(target_os = "linux")]
use crate::config::BackendKind;
#[cfg(not(target_os = "linux"))]
use crate::error::Error;

/// A single authentication/authorization request from the UI layer.
///
/// `reason_or_action` is the prompt reason for the credential backend and the
/// action name for the policy backend. Constructed per call, never shared.
#[derive(Debug)]
pub struct CheckRequest {
    pub reason_or_action: String,
    pub credential: Option<String>,
}

/// Capability set every backend provides.
///
/// `authenticate` owns the `PendingCall` and must consume it on every path;
/// the bridge turns a forgotten path into a debug assertion.
#[allow(async_fn_in_trait)]
pub trait AuthBackend {
    /// Cheap capability probe. Must never error and must not perform a real
    /// check.
    async fn check_support(&self) -> bool;

    /// Run one check and deliver exactly one outcome through `call`.
    async fn authenticate(
        &self,
        request: CheckRequest,
        call: PendingCall,
        cancel: CancellationToken,
    );
}

/// Concrete backend selected from configuration.
pub enum Backend {
    #[cfg(target_os = "linux")]
    Credential(credential::CredentialBackend),
    #[cfg(target_os = "linux")]
    Policy(policy::PolicyBackend),
    #[cfg(not(target_os = "linux"))]
    Unsupported(UnsupportedBackend),
}

impl Backend {
    pub fn from_config(config: &ShellConfig) -> Backend {
        #[cfg(target_os = "linux")]
        {
            match config.backend {
                BackendKind::Credential => {
                    Backend::Credential(credential::CredentialBackend::new(&config.pam_service))
                }
                BackendKind::Policy => Backend::Policy(policy::PolicyBackend::new(config)),
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = config;
            Backend::Unsupported(UnsupportedBackend)
        }
    }
}

impl AuthBackend for Backend {
    async fn check_support(&self) -> bool {
        match self {
            #[cfg(target_os = "linux")]
            Backend::Credential(backend) => backend.check_support().await,
            #[cfg(target_os = "linux")]
            Backend::Policy(backend) => backend.check_support().await,
            #[cfg(not(target_os = "linux"))]
            Backend::Unsupported(backend) => backend.check_support().await,
        }
    }

    async fn authenticate(
        &self,
        request: CheckRequest,
        call: PendingCall,
        cancel: CancellationToken,
    ) {
        match self {
            #[cfg(target_os = "linux")]
            Backend::Credential(backend) => backend.authenticate(request, call, cancel).await,
            #[cfg(target_os = "linux")]
            Backend::Policy(backend) => backend.authenticate(request, call, cancel).await,
            #[cfg(not(target_os = "linux"))]
            Backend::Unsupported(backend) => backend.authenticate(request, call, cancel).await,
        }
    }
}

/// Placeholder backend for platforms without a native check subsystem.
#[cfg(not(target_os = "linux"))]
pub struct UnsupportedBackend;

#[cfg(not(target_os = "linux"))]
impl AuthBackend for UnsupportedBackend {
    async fn check_support(&self) -> bool {
        false
    }

    async fn authenticate(
        &self,
        _request: CheckRequest,
        call: PendingCall,
        _cancel: CancellationToken,
    ) {
        call.fail(Error::SessionStart);
    }
}
