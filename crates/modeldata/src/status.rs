//! # Operation Status Tracking
//!
//! Every cache operation reports into a [`StatusTracker`] instead of talking to
//! a UI. The tracker keeps a busy flag and the outcome of the most recent
//! operation, and publishes each change as a [`StatusSnapshot`] on a
//! `tokio::sync::watch` channel.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──begin──▶ Busy ──complete──▶ Succeeded | Failed ──begin──▶ Busy ...
//! ```
//!
//! Overlapping calls are counted: `busy` stays true until the last in-flight
//! operation settles, and the outcome shown is whichever settled last.
//!
//! `begin` hands back a [`BusyGuard`]. An operation whose future is dropped
//! mid-flight settles through the guard's `Drop` with no new outcome, so the
//! tracker returns to the previous result instead of staying busy.
//!
//! ## Outcome Wire Shape
//!
//! [`Outcome`] serializes as `{"kind": "success", "message": ...}` or
//! `{"kind": "failure", "message": ...}`. For failures, `message` is the text
//! extracted from the underlying error; the adapter pairs it with
//! [`OperationKind::failure_headline`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Load,
    Create,
    Update,
    Delete,
    Reset,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Load => "load",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Reset => "reset",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            OperationKind::Load => "Data loaded successfully",
            OperationKind::Create => "Item created successfully",
            OperationKind::Update => "Item updated successfully",
            OperationKind::Delete => "Item deleted successfully",
            OperationKind::Reset => "Data reset",
        }
    }

    pub fn failure_headline(self) -> &'static str {
        match self {
            OperationKind::Load => "Failed to load data",
            OperationKind::Create => "Failed to create item",
            OperationKind::Update => "Failed to update item",
            OperationKind::Delete => "Failed to delete item",
            OperationKind::Reset => "Failed to reset data",
        }
    }

    /// Whether the operation writes to storage.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            OperationKind::Create | OperationKind::Update | OperationKind::Delete
        )
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Success { message: String },
    Failure { message: String },
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome::Success {
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message } | Outcome::Failure { message } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Busy,
    Succeeded,
    Failed,
}

/// Point-in-time view of the tracker, as seen by a presentation adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub busy: bool,
    /// The operation that started or settled most recently.
    pub operation: Option<OperationKind>,
    /// Outcome of the most recently settled operation.
    pub outcome: Option<Outcome>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            busy: false,
            operation: None,
            outcome: None,
        }
    }
}

pub struct StatusTracker {
    in_flight: Mutex<usize>,
    tx: watch::Sender<StatusSnapshot>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self {
            in_flight: Mutex::new(0),
            tx,
        }
    }

    /// Mark `op` as started. The operation stays in flight until the
    /// returned guard is completed or dropped.
    pub fn begin(&self, op: OperationKind) -> BusyGuard<'_> {
        let mut in_flight = self.in_flight.lock();
        *in_flight += 1;
        self.tx.send_modify(|snap| {
            snap.phase = Phase::Busy;
            snap.busy = true;
            snap.operation = Some(op);
        });
        BusyGuard {
            tracker: self,
            op,
            settled: false,
        }
    }

    /// Take one operation out of flight. With an outcome it becomes the
    /// latest result; without one (a cancelled call) the previous result
    /// stays current.
    fn settle(&self, op: OperationKind, outcome: Option<Outcome>) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        let still_busy = *in_flight > 0;
        self.tx.send_modify(|snap| {
            if let Some(outcome) = outcome {
                snap.operation = Some(op);
                snap.outcome = Some(outcome);
            }
            snap.busy = still_busy;
            snap.phase = match (still_busy, &snap.outcome) {
                (true, _) => Phase::Busy,
                (false, Some(outcome)) if outcome.is_success() => Phase::Succeeded,
                (false, Some(_)) => Phase::Failed,
                (false, None) => Phase::Idle,
            };
        });
    }

    /// Record an outcome for a synchronous operation that never went busy.
    pub fn record(&self, op: OperationKind, outcome: Outcome) {
        let _in_flight = self.in_flight.lock();
        self.tx.send_modify(|snap| {
            if !snap.busy {
                snap.phase = if outcome.is_success() {
                    Phase::Succeeded
                } else {
                    Phase::Failed
                };
                snap.operation = Some(op);
            }
            snap.outcome = Some(outcome);
        });
    }

    pub fn is_busy(&self) -> bool {
        self.tx.borrow().busy
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.tx.borrow().outcome.clone()
    }

    /// Subscribe to status changes. The receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }
}

/// An in-flight operation on a [`StatusTracker`].
///
/// [`BusyGuard::complete`] settles it with an outcome. Dropping the guard
/// without completing it (the caller abandoned the future) still takes the
/// operation out of flight, so `busy` cannot stick.
#[must_use = "dropping the guard immediately settles the operation as cancelled"]
pub struct BusyGuard<'a> {
    tracker: &'a StatusTracker,
    op: OperationKind,
    settled: bool,
}

impl BusyGuard<'_> {
    pub fn operation(&self) -> OperationKind {
        self.op
    }

    /// Settle the operation with `outcome`.
    pub fn complete(mut self, outcome: Outcome) {
        self.settled = true;
        self.tracker.settle(self.op, Some(outcome));
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(operation = self.op.as_str(), "operation cancelled");
            self.tracker.settle(self.op, None);
        }
    }
}
