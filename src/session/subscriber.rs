use tokio::sync::mpsc::Receiver;

use crate::broker::message::Message;
use crate::broker::room::SubscriberId;

/// One subscriber's view of its registration in a room.
///
/// Returned by the broker when a subscription is created. The `receiver` is
/// the only receive end of this subscriber's inbound queue; the broker keeps
/// the matching send end inside the room entry and uses it for delivery.
#[derive(Debug)]
pub struct Subscription {
    /// Identity of this subscription inside its room. Two subscriptions to
    /// the same room are always distinct, whatever client opened them.
    pub id: SubscriberId,

    /// The room this subscription is attached to.
    pub room: String,

    /// Receive end of the inbound queue the broker delivers into.
    pub receiver: Receiver<Message>,
}

impl Subscription {
    pub fn new(id: SubscriberId, room: String, receiver: Receiver<Message>) -> Self {
        Self { id, room, receiver }
    }
}
