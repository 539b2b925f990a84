//! Dialog outcomes and the one-shot ticket resolving them.
//!
//! Cancellation is a first-class variant, not an error: flows that end by
//! user choice resolve Cancelled, flows that break resolve Failed with the
//! failure's message. A ticket settles exactly once; the sender side is
//! consumed on resolution, so double settlement is unrepresentable.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::warn;
use uuid::Uuid;

/// The modal dialogs the orchestrator runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Publish,
    ImageExport,
    VideoExport,
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogKind::Publish => write!(f, "publish"),
            DialogKind::ImageExport => write!(f, "image export"),
            DialogKind::VideoExport => write!(f, "video export"),
        }
    }
}

/// How a dialog flow ended.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogOutcome<T> {
    /// User confirmed and the downstream command succeeded.
    Confirmed(T),
    /// User dismissed the dialog (or a picker inside the flow).
    Cancelled,
    /// Something broke; carries the failure's message.
    Failed(String),
}

impl<T> DialogOutcome<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, DialogOutcome::Confirmed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DialogOutcome::Cancelled)
    }
}

/// Caller-side handle for one show() call.
///
/// The shell keeps processing events while a ticket is open; poll
/// try_outcome() once per frame, or wait() from a worker thread.
pub struct DialogTicket<T> {
    id: Uuid,
    rx: Receiver<DialogOutcome<T>>,
}

impl<T> DialogTicket<T> {
    /// One-shot channel: sender resolves, ticket observes.
    pub(crate) fn channel() -> (Sender<DialogOutcome<T>>, Self) {
        let (tx, rx) = bounded(1);
        (tx, Self { id: Uuid::new_v4(), rx })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Non-blocking check; Some exactly once, when the dialog resolved.
    pub fn try_outcome(&self) -> Option<DialogOutcome<T>> {
        self.rx.try_recv().ok()
    }

    /// Block until resolution. A dialog dropped without resolving (orchestrator
    /// teardown) counts as cancelled.
    pub fn wait(&self) -> DialogOutcome<T> {
        self.rx.recv().unwrap_or_else(|_| {
            warn!("dialog dropped without resolution, treating as cancelled");
            DialogOutcome::Cancelled
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_settles_once() {
        let (tx, ticket) = DialogTicket::<i32>::channel();
        assert!(ticket.try_outcome().is_none());

        tx.send(DialogOutcome::Confirmed(7)).unwrap();
        assert_eq!(ticket.try_outcome(), Some(DialogOutcome::Confirmed(7)));
        // Settled exactly once
        assert!(ticket.try_outcome().is_none());
    }

    #[test]
    fn test_dropped_sender_reads_as_cancelled() {
        let (tx, ticket) = DialogTicket::<i32>::channel();
        drop(tx);
        assert_eq!(ticket.wait(), DialogOutcome::Cancelled);
    }
}
