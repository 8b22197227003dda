use std::sync::{Mutex, PoisonError};

use flume::{Receiver, Sender};

use crate::TerritoryId;

/// Receiving end of territory change notifications.
/// There's no explicit unsubscribe. Dropping this disconnects the channel and the broadcaster forgets about it.
#[derive(Debug)]
pub struct TerritorySubscription {
    receiver: Receiver<TerritoryId>,
}

impl TerritorySubscription {
    /// all notifications that arrived since the last call, oldest first. Never blocks.
    pub fn drain(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.receiver.try_iter()
    }
}

/// Fans out territory change notifications to any number of subscriptions.
/// Host implementations can embed this to implement [crate::ClientState::subscribe_territory_changed].
#[derive(Debug, Default)]
pub struct TerritoryBroadcaster {
    senders: Mutex<Vec<Sender<TerritoryId>>>,
}

impl TerritoryBroadcaster {
    pub fn subscribe(&self) -> TerritorySubscription {
        let (sender, receiver) = flume::unbounded();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        TerritorySubscription { receiver }
    }

    /// Sends `territory_id` to every live subscription and returns how many got it.
    pub fn emit(&self, territory_id: TerritoryId) -> usize {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|sender| sender.send(territory_id).is_ok());
        senders.len()
    }

    pub fn subscriber_count(&self) -> usize {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|sender| !sender.is_disconnected());
        senders.len()
    }
}
