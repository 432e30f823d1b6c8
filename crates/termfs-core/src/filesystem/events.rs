//! Change notification.
//!
//! The engine emits one [`FsEvent`] per successful mutation to every live
//! subscriber over an mpsc channel. Receivers that were dropped are pruned on
//! the next emission.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::models::NodeKind;

/// A successful mutation of the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsEvent {
    Created { path: String, kind: NodeKind },
    Written { path: String, size: u64 },
    Touched { path: String },
    Renamed { old_path: String, new_path: String },
    Moved { old_path: String, new_path: String },
    Copied { source: String, path: String },
    Deleted { path: String },
}

impl FsEvent {
    /// Paths touched by this event.
    pub fn affected_paths(&self) -> Vec<&str> {
        match self {
            Self::Created { path, .. }
            | Self::Written { path, .. }
            | Self::Touched { path }
            | Self::Deleted { path }
            | Self::Copied { path, .. } => vec![path.as_str()],
            Self::Renamed { old_path, new_path } | Self::Moved { old_path, new_path } => {
                vec![old_path.as_str(), new_path.as_str()]
            }
        }
    }
}

/// Handle identifying one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A live subscription: read events from `receiver`.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: Receiver<FsEvent>,
}

#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<(SubscriptionId, Sender<FsEvent>)>,
    next_id: u64,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, sender));
        Subscription { id, receiver }
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: FsEvent) {
        tracing::trace!(?event, "fs event");
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(path: &str) -> FsEvent {
        FsEvent::Deleted {
            path: path.to_string(),
        }
    }

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let mut bus = EventBus::default();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.emit(deleted("/x"));
        assert_eq!(a.receiver.try_recv().unwrap(), deleted("/x"));
        assert_eq!(b.receiver.try_recv().unwrap(), deleted("/x"));
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::default();
        let sub = bus.subscribe();
        assert!(bus.unsubscribe(sub.id));
        assert!(!bus.unsubscribe(sub.id));
        bus.emit(deleted("/x"));
        assert!(sub.receiver.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let mut bus = EventBus::default();
        let sub = bus.subscribe();
        drop(sub);
        bus.emit(deleted("/x"));
        assert_eq!(bus.len(), 0);
    }

    #[test]
    fn test_affected_paths() {
        let event = FsEvent::Moved {
            old_path: "/a".into(),
            new_path: "/b/a".into(),
        };
        assert_eq!(event.affected_paths(), vec!["/a", "/b/a"]);
    }
}
