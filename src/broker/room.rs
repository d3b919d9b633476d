use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::broker::message::Message;

pub type SubscriberId = Uuid;

/// The broker-side half of one open stream connection: the subscriber's
/// identity and the send end of its bounded inbound queue. The receive end
/// is owned exclusively by the session serving that connection.
#[derive(Debug)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub sender: mpsc::Sender<Message>,
}

/// A named fan-out group.
///
/// Subscribers are kept in insertion order so delivery order within a room
/// is deterministic. A room holds at most one entry per subscriber id; ids
/// are minted once per subscription, so membership stays duplicate-free by
/// construction.
#[derive(Debug)]
pub struct Room {
    pub name: String,
    pub subscribers: Vec<Subscriber>,
}

impl Room {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    /// Adds a subscriber to the room.
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    /// Removes a subscriber from the room.
    /// If the subscriber is not present, it has no effect.
    pub fn unsubscribe(&mut self, id: &SubscriberId) {
        self.subscribers.retain(|s| s.id != *id);
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Hands one message to every subscriber of the room without blocking.
    ///
    /// A full queue means the subscriber is consuming too slowly; the
    /// message is dropped for that subscriber only. A closed queue means the
    /// session is already tearing down and its unsubscribe is in flight.
    pub fn deliver(&self, msg: &Message) {
        for subscriber in &self.subscribers {
            match subscriber.sender.try_send(msg.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(room = %self.name, subscriber = %subscriber.id, id = msg.id,
                        "queue full, dropping message for slow subscriber");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(room = %self.name, subscriber = %subscriber.id, id = msg.id,
                        "subscriber queue closed, skipping delivery");
                }
            }
        }
    }
}
