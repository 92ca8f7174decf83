//! Exactly-once delivery of check outcomes to the caller.
//!
//! A backend check may finish synchronously (credential verification) or via
//! an asynchronous completion (policy authorization). Either way the original
//! caller must see exactly one outcome. `PendingCall` is move-only task state:
//! completing it consumes it, so a second delivery is a compile error rather
//! than a runtime one.

use tokio::sync::oneshot;

use crate::error::Error;

/// Outcome of a single credential or policy check.
pub type CheckOutcome = crate::error::Result<bool>;

/// In-flight handle for a caller awaiting an outcome.
///
/// Every path through a backend must consume this, including every error
/// branch. Dropping it without completing is a programming error: it asserts
/// in debug builds and defensively delivers `Cancelled` in release builds so
/// the caller is never left hanging.
pub struct PendingCall {
    tx: Option<oneshot::Sender<CheckOutcome>>,
}

/// Receiving side handed back to the dispatcher.
pub struct OutcomeSlot {
    rx: oneshot::Receiver<CheckOutcome>,
}

/// Create a pending call and the slot its outcome will arrive in.
pub fn register() -> (PendingCall, OutcomeSlot) {
    let (tx, rx) = oneshot::channel();
    (PendingCall { tx: Some(tx) }, OutcomeSlot { rx })
}

impl PendingCall {
    /// Deliver the one and only outcome for this call.
    pub fn complete(mut self, outcome: CheckOutcome) {
        // `tx` is only ever taken here or in Drop, and Drop sees it empty
        // after this runs.
        if let Some(tx) = self.tx.take() {
            // A closed receiver means the caller went away; there is nobody
            // left to deliver to.
            let _ = tx.send(outcome);
        }
    }

    pub fn succeed(self, granted: bool) {
        self.complete(Ok(granted));
    }

    pub fn fail(self, err: Error) {
        self.complete(Err(err));
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            debug_assert!(false, "PendingCall dropped without an outcome");
            let _ = tx.send(Err(Error::Cancelled));
        }
    }
}

impl OutcomeSlot {
    /// Await the single outcome for the registered call.
    pub async fn outcome(self) -> CheckOutcome {
        // The sender half never disappears without sending (see Drop above);
        // a recv error can only mean the process is tearing down mid-call.
        self.rx.await.unwrap_or(Err(Error::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_delivered_once() {
        let (call, slot) = register();
        call.succeed(true);
        assert_eq!(slot.outcome().await.unwrap(), true);
    }

    #[tokio::test]
    async fn test_denial_is_ok_false() {
        let (call, slot) = register();
        call.succeed(false);
        assert_eq!(slot.outcome().await.unwrap(), false);
    }

    #[tokio::test]
    async fn test_error_branch_still_delivers() {
        let (call, slot) = register();
        tokio::spawn(async move {
            call.fail(Error::PolicyUnavailable("system bus unreachable".into()));
        });
        let err = slot.outcome().await.unwrap_err();
        assert_eq!(err.code(), "authInitError");
    }

    #[tokio::test]
    async fn test_outcome_survives_task_handoff() {
        let (call, slot) = register();
        let handle = tokio::spawn(async move {
            tokio::task::yield_now().await;
            call.succeed(true);
        });
        assert_eq!(slot.outcome().await.unwrap(), true);
        handle.await.unwrap();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "PendingCall dropped without an outcome")]
    fn test_dropping_uncompleted_call_asserts() {
        let (call, _slot) = register();
        drop(call);
    }

    #[tokio::test]
    async fn test_caller_gone_does_not_panic() {
        let (call, slot) = register();
        drop(slot);
        call.succeed(true);
    }
}
