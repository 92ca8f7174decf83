//! Auth-state callback registry and the identity-SDK function table.
//!
//! The managed UI layer reports sign-in changes through `user_changed`; the
//! registry fans those out to listeners the identity SDK registered. Listener
//! identity is the (callback, context) pair, matching how the SDK hands its
//! callbacks across the boundary.

use std::collections::HashMap;

/// Listener invoked with the current user uid (if any) and its context value.
pub type AuthStateListener = fn(Option<&str>, usize);

struct ListenerEntry {
    callback: AuthStateListener,
    context: usize,
}

impl ListenerEntry {
    fn matches(&self, callback: AuthStateListener, context: usize) -> bool {
        self.callback as usize == callback as usize && self.context == context
    }
}

/// Ordered listener collection plus the process-wide current-user uid.
///
/// Listeners fire synchronously on the calling thread, in registration order.
/// They must not block or re-enter the registry.
#[derive(Default)]
pub struct CallbackRegistry {
    listeners: Vec<ListenerEntry>,
    current_user_uid: Option<String>,
}

impl CallbackRegistry {
    pub fn add_listener(&mut self, callback: AuthStateListener, context: usize) {
        self.listeners.push(ListenerEntry { callback, context });
    }

    /// Remove the first listener matching the exact (callback, context) pair.
    /// Removing a pair that was never registered is a no-op.
    pub fn remove_listener(&mut self, callback: AuthStateListener, context: usize) {
        if let Some(pos) = self
            .listeners
            .iter()
            .position(|entry| entry.matches(callback, context))
        {
            self.listeners.remove(pos);
        }
    }

    /// Invoke every registered listener with the current uid.
    pub fn notify_all(&self) {
        for entry in &self.listeners {
            (entry.callback)(self.current_user_uid.as_deref(), entry.context);
        }
    }

    /// Last-write-wins; there is no other uid lifecycle.
    pub fn set_current_user_uid(&mut self, uid: Option<String>) {
        self.current_user_uid = uid;
    }

    pub fn current_user_uid(&self) -> Option<&str> {
        self.current_user_uid.as_deref()
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// The four operations the identity SDK binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkFunction {
    AddAuthStateListener,
    RemoveAuthStateListener,
    NotifyAuthStateChanged,
    GetCurrentUserUid,
}

impl SdkFunction {
    pub const ALL: [SdkFunction; 4] = [
        SdkFunction::AddAuthStateListener,
        SdkFunction::RemoveAuthStateListener,
        SdkFunction::NotifyAuthStateChanged,
        SdkFunction::GetCurrentUserUid,
    ];
}

/// Function table installed per SDK app instance.
///
/// Each slot is a plain function pointer over the registry, so the table can
/// be handed to the SDK integration point without exposing the registry type.
pub struct SdkFunctionTable {
    pub add_listener: fn(&mut CallbackRegistry, AuthStateListener, usize),
    pub remove_listener: fn(&mut CallbackRegistry, AuthStateListener, usize),
    pub notify_all: fn(&CallbackRegistry),
    pub get_current_user_uid: fn(&CallbackRegistry) -> Option<String>,
}

impl SdkFunctionTable {
    fn wired() -> Self {
        SdkFunctionTable {
            add_listener: CallbackRegistry::add_listener,
            remove_listener: CallbackRegistry::remove_listener,
            notify_all: CallbackRegistry::notify_all,
            get_current_user_uid: |registry| registry.current_user_uid().map(str::to_owned),
        }
    }

    pub fn slot_count(&self) -> usize {
        SdkFunction::ALL.len()
    }
}

/// Explicit registry of installed SDK function tables, keyed by app name.
#[derive(Default)]
pub struct SdkRegistry {
    installs: HashMap<String, SdkFunctionTable>,
}

impl SdkRegistry {
    /// Install the four registry functions for the named SDK app instance.
    /// Installing again for the same name overwrites the previous table.
    pub fn install(&mut self, app_name: &str) {
        self.installs
            .insert(app_name.to_owned(), SdkFunctionTable::wired());
    }

    pub fn table(&self, app_name: &str) -> Option<&SdkFunctionTable> {
        self.installs.get(app_name)
    }

    pub fn is_installed(&self, app_name: &str) -> bool {
        self.installs.contains_key(app_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static FIRED: RefCell<Vec<(usize, Option<String>)>> = RefCell::new(Vec::new());
    }

    fn recording_listener(uid: Option<&str>, context: usize) {
        FIRED.with(|fired| {
            fired
                .borrow_mut()
                .push((context, uid.map(str::to_owned)));
        });
    }

    fn other_listener(_uid: Option<&str>, _context: usize) {}

    fn take_fired() -> Vec<(usize, Option<String>)> {
        FIRED.with(|fired| fired.borrow_mut().drain(..).collect())
    }

    #[test]
    fn test_notify_in_registration_order() {
        take_fired();
        let mut registry = CallbackRegistry::default();
        registry.add_listener(recording_listener, 1);
        registry.add_listener(recording_listener, 2);
        registry.add_listener(recording_listener, 3);
        registry.set_current_user_uid(Some("u1".into()));
        registry.notify_all();

        let fired = take_fired();
        let contexts: Vec<usize> = fired.iter().map(|(c, _)| *c).collect();
        assert_eq!(contexts, vec![1, 2, 3]);
        assert!(fired.iter().all(|(_, uid)| uid.as_deref() == Some("u1")));
    }

    #[test]
    fn test_removed_listener_never_fires_again() {
        take_fired();
        let mut registry = CallbackRegistry::default();
        registry.add_listener(recording_listener, 1);
        registry.add_listener(recording_listener, 2);
        registry.remove_listener(recording_listener, 1);
        registry.notify_all();

        let fired = take_fired();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 2);
    }

    #[test]
    fn test_remove_unregistered_pair_is_noop() {
        let mut registry = CallbackRegistry::default();
        registry.add_listener(recording_listener, 1);
        // Same context, different callback: no match.
        registry.remove_listener(other_listener, 1);
        // Same callback, different context: no match.
        registry.remove_listener(recording_listener, 99);
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_remove_takes_first_matching_duplicate() {
        let mut registry = CallbackRegistry::default();
        registry.add_listener(recording_listener, 7);
        registry.add_listener(recording_listener, 7);
        registry.remove_listener(recording_listener, 7);
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_uid_last_write_wins() {
        let mut registry = CallbackRegistry::default();
        assert_eq!(registry.current_user_uid(), None);
        registry.set_current_user_uid(Some("u1".into()));
        registry.set_current_user_uid(Some("u2".into()));
        assert_eq!(registry.current_user_uid(), Some("u2"));
        registry.set_current_user_uid(None);
        assert_eq!(registry.current_user_uid(), None);
    }

    #[test]
    fn test_install_registers_four_slots() {
        let mut sdk = SdkRegistry::default();
        assert!(!sdk.is_installed("myapp"));
        sdk.install("myapp");
        assert!(sdk.is_installed("myapp"));
        assert_eq!(sdk.table("myapp").unwrap().slot_count(), 4);
    }

    #[test]
    fn test_installed_table_drives_registry() {
        take_fired();
        let mut sdk = SdkRegistry::default();
        sdk.install("myapp");
        let table = sdk.table("myapp").unwrap();

        let mut registry = CallbackRegistry::default();
        (table.add_listener)(&mut registry, recording_listener, 5);
        registry.set_current_user_uid(Some("u1".into()));
        (table.notify_all)(&registry);
        assert_eq!(take_fired(), vec![(5, Some("u1".into()))]);
        assert_eq!(
            (table.get_current_user_uid)(&registry),
            Some("u1".to_string())
        );
        (table.remove_listener)(&mut registry, recording_listener, 5);
        (table.notify_all)(&registry);
        assert!(take_fired().is_empty());
    }
}
