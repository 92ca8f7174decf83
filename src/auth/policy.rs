//! Policy backend: polkit authorization checks over the system bus.
//!
//! References:
//!  - https://www.freedesktop.org/software/polkit/docs/master/eggdbus-interface-org.freedesktop.PolicyKit1.Authority.html

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;
use zbus::zvariant::Value;

use crate::auth::{AuthBackend, CheckRequest};
use crate::bridge::PendingCall;
use crate::config::{ShellConfig, SubjectKind};
use crate::error::Error;

/// CheckAuthorization flag: the authority may raise an interactive
/// confirmation through the session's authentication agent.
const ALLOW_USER_INTERACTION: u32 = 1;

/// polkit subject: (kind, details).
type Subject<'a> = (&'a str, HashMap<&'a str, &'a Value<'a>>);

/// CheckAuthorization result: (is_authorized, is_challenge, details).
type AuthorizationResult = (bool, bool, HashMap<String, String>);

/// EnumerateActions entry; only the action id (first field) matters here.
type ActionDescription = (
    String,
    String,
    String,
    String,
    String,
    String,
    u32,
    u32,
    u32,
    HashMap<String, String>,
);

#[zbus::proxy(
    interface = "org.freedesktop.PolicyKit1.Authority",
    default_service = "org.freedesktop.PolicyKit1",
    default_path = "/org/freedesktop/PolicyKit1/Authority",
    gen_blocking = false
)]
trait Authority {
    fn check_authorization(
        &self,
        subject: &Subject<'_>,
        action_id: &str,
        details: HashMap<&str, &str>,
        flags: u32,
        cancellation_id: &str,
    ) -> zbus::Result<AuthorizationResult>;

    fn cancel_check_authorization(&self, cancellation_id: &str) -> zbus::Result<()>;

    fn enumerate_actions(&self, locale: &str) -> zbus::Result<Vec<ActionDescription>>;

    #[zbus(property)]
    fn backend_name(&self) -> zbus::Result<String>;
}

static NEXT_CANCELLATION_ID: AtomicU64 = AtomicU64::new(1);

pub struct PolicyBackend {
    action_domain: String,
    subject: SubjectKind,
    strict_support_probe: bool,
}

impl PolicyBackend {
    pub fn new(config: &ShellConfig) -> Self {
        PolicyBackend {
            action_domain: config.action_domain.clone(),
            subject: config.subject,
            strict_support_probe: config.strict_support_probe,
        }
    }

    fn action_id(&self, action: &str) -> String {
        format!("{}.{}", self.action_domain, action)
    }
}

fn next_cancellation_id() -> String {
    format!(
        "authenticator-check-{}",
        NEXT_CANCELLATION_ID.fetch_add(1, Ordering::Relaxed)
    )
}

impl AuthBackend for PolicyBackend {
    async fn check_support(&self) -> bool {
        let Ok(conn) = zbus::Connection::system().await else {
            return false;
        };
        let Ok(authority) = AuthorityProxy::new(&conn).await else {
            return false;
        };
        if self.strict_support_probe {
            // Stricter probe: our action ids must actually be registered.
            match authority.enumerate_actions("").await {
                Ok(actions) => actions
                    .iter()
                    .any(|action| action.0.starts_with(&self.action_domain)),
                Err(_) => false,
            }
        } else {
            // Reachability probe: a property round-trip answers on the bus.
            authority.backend_name().await.is_ok()
        }
    }

    async fn authenticate(
        &self,
        request: CheckRequest,
        call: PendingCall,
        cancel: CancellationToken,
    ) {
        let conn = match zbus::Connection::system().await {
            Ok(conn) => conn,
            Err(e) => return call.fail(Error::PolicyUnavailable(e.to_string())),
        };
        let authority = match AuthorityProxy::new(&conn).await {
            Ok(authority) => authority,
            Err(e) => return call.fail(Error::PolicyUnavailable(e.to_string())),
        };

        let action_id = self.action_id(&request.reason_or_action);
        let cancellation_id = next_cancellation_id();

        let pid = Value::from(std::process::id());
        let start_time = Value::from(0u64);
        let unique_name;
        let mut subject_details: HashMap<&str, &Value> = HashMap::new();
        let subject: Subject = match self.subject {
            SubjectKind::Process => {
                subject_details.insert("pid", &pid);
                subject_details.insert("start-time", &start_time);
                ("unix-process", subject_details)
            }
            SubjectKind::BusConnection => {
                let Some(name) = conn.unique_name() else {
                    return call.fail(Error::PolicyUnavailable(
                        "bus connection has no unique name".to_string(),
                    ));
                };
                unique_name = Value::from(name.as_str());
                subject_details.insert("name", &unique_name);
                ("system-bus-name", subject_details)
            }
        };

        tokio::select! {
            result = authority.check_authorization(
                &subject,
                &action_id,
                HashMap::new(),
                ALLOW_USER_INTERACTION,
                &cancellation_id,
            ) => match result {
                Ok((authorized, _is_challenge, _details)) => {
                    if !authorized {
                        tracing::debug!(action = %action_id, "authority denied authorization");
                    }
                    call.succeed(authorized)
                }
                Err(e) => call.fail(Error::AuthorizationCheck(e.to_string())),
            },
            _ = cancel.cancelled() => {
                if let Err(e) = authority.cancel_check_authorization(&cancellation_id).await {
                    tracing::warn!(error = %e, "failed to cancel in-flight authorization check");
                }
                call.fail(Error::Cancelled);
            }
        }
    }
}
