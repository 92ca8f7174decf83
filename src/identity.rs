//! Desktop identity lookup via AccountsService.
//!
//! Lookups here are best-effort: every failure is masked behind a fallback
//! value and never surfaced to the UI layer as an error.

/// Directory AccountsService stores per-user avatar icons in.
const AVATAR_ICON_DIR: &str = "/var/lib/AccountsService/icons";

const FALLBACK_DISPLAY_NAME: &str = "Unknown";

#[cfg(target_os = "linux")]
mod accounts {
    use zbus::zvariant::OwnedObjectPath;

    #[zbus::proxy(
        interface = "org.freedesktop.Accounts",
        default_service = "org.freedesktop.Accounts",
        default_path = "/org/freedesktop/Accounts",
        gen_blocking = false
    )]
    pub trait Accounts {
        fn find_user_by_name(&self, name: &str) -> zbus::Result<OwnedObjectPath>;
    }

    #[zbus::proxy(
        interface = "org.freedesktop.Accounts.User",
        default_service = "org.freedesktop.Accounts",
        gen_blocking = false
    )]
    pub trait AccountsUser {
        #[zbus(property)]
        fn real_name(&self) -> zbus::Result<String>;
    }
}

/// Resolve the current user's display name, falling back to `"Unknown"` on
/// any failure (bus unreachable, user not found, property missing, empty).
pub async fn display_name() -> String {
    match lookup_real_name().await {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => FALLBACK_DISPLAY_NAME.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "display name lookup failed, using fallback");
            FALLBACK_DISPLAY_NAME.to_string()
        }
    }
}

/// Path the desktop stores the current user's avatar at. The file may not
/// exist; callers treat a missing file as "no avatar", not an error.
pub fn avatar_path() -> String {
    format!("{}/{}", AVATAR_ICON_DIR, login_name())
}

fn login_name() -> String {
    whoami::username()
}

#[cfg(target_os = "linux")]
async fn lookup_real_name() -> zbus::Result<String> {
    use accounts::{AccountsProxy, AccountsUserProxy};

    let conn = zbus::Connection::system().await?;
    let accounts = AccountsProxy::new(&conn).await?;
    let user_path = accounts.find_user_by_name(&login_name()).await?;
    let user = AccountsUserProxy::builder(&conn)
        .path(user_path)?
        .build()
        .await?;
    user.real_name().await
}

#[cfg(not(target_os = "linux"))]
async fn lookup_real_name() -> std::io::Result<String> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no account service on this platform",
    ))
}
