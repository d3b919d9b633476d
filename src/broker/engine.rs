use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::broker::message::{EventKind, Message};
use crate::broker::room::{Room, Subscriber, SubscriberId};
use crate::session::Subscription;
use crate::utils::error::Error;

/// A state transition request submitted to the broker.
///
/// These three variants are the only way to read or write the room mapping.
/// Any number of tasks may submit requests concurrently; the broker task
/// drains them and applies them strictly one at a time in arrival order,
/// which is what keeps the mapping free of races without a lock.
#[derive(Debug)]
pub enum BrokerRequest {
    /// Register a new subscriber in `room` and reply with its subscription.
    Subscribe {
        room: String,
        resp: oneshot::Sender<Subscription>,
    },
    /// Remove `subscriber` from `room`. Removing a subscriber that is absent
    /// or was never registered is a silent no-op.
    Unsubscribe {
        room: String,
        subscriber: SubscriberId,
    },
    /// Fan `data` out to every current subscriber of `room`.
    Publish {
        room: String,
        event: EventKind,
        data: String,
    },
}

/// The broker that manages rooms and their subscribers.
///
/// It maintains the mapping from room names to subscriber lists and the
/// broker-wide message id counter. The struct itself is single-threaded by
/// design: it is owned by the task running [`run`], mutated only there, and
/// reached from everywhere else through a [`BrokerHandle`]. Rooms come into
/// existence when their first subscriber arrives and are pruned when their
/// last subscriber leaves.
#[derive(Debug)]
pub struct Broker {
    rooms: HashMap<String, Room>,
    next_id: u64,
    queue_capacity: usize,
}

impl Broker {
    /// Creates a new broker with no rooms. `queue_capacity` bounds each
    /// subscriber's inbound queue; a subscriber that falls this far behind
    /// starts losing messages rather than stalling delivery to others.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            next_id: 1,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a new subscriber in a room, creating the room if it does
    /// not exist yet. Returns the subscription owning the receive end of the
    /// fresh inbound queue.
    pub fn subscribe(&mut self, room: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = Uuid::new_v4();
        let entry = self
            .rooms
            .entry(room.to_string())
            .or_insert_with(|| Room::new(room));
        entry.subscribe(Subscriber { id, sender: tx });
        debug!(room = %room, subscriber = %id, "subscribed");
        Subscription::new(id, room.to_string(), rx)
    }

    /// Removes a subscriber from a room. The room entry is dropped once its
    /// last subscriber is gone, so an idle broker holds no state. Unknown
    /// rooms and unknown subscribers are silent no-ops.
    pub fn unsubscribe(&mut self, room: &str, subscriber: &SubscriberId) {
        if let Some(r) = self.rooms.get_mut(room) {
            r.unsubscribe(subscriber);
            debug!(room = %room, subscriber = %subscriber, "unsubscribed");
            if r.is_empty() {
                self.rooms.remove(room);
                debug!(room = %room, "room empty, pruned");
            }
        }
    }

    /// Assigns the next message id and delivers the message to every current
    /// subscriber of the room. Publishing to a room with no subscribers
    /// drops the message without creating the room. Delivery never blocks;
    /// see [`Room::deliver`] for the slow-consumer policy.
    pub fn publish(&mut self, room: &str, event: EventKind, data: String) {
        let Some(r) = self.rooms.get(room) else {
            debug!(room = %room, "publish to empty room, dropping");
            return;
        };
        let msg = Message {
            id: self.next_id,
            event,
            data,
        };
        self.next_id += 1;
        r.deliver(&msg);
    }

    /// Applies one request against broker state.
    fn apply(&mut self, request: BrokerRequest) {
        match request {
            BrokerRequest::Subscribe { room, resp } => {
                let subscription = self.subscribe(&room);
                // The caller may have vanished between submitting and now;
                // its queue dies with the returned subscription and the
                // session never starts, so nothing is left behind.
                if let Err(sub) = resp.send(subscription) {
                    self.unsubscribe(&sub.room, &sub.id);
                }
            }
            BrokerRequest::Unsubscribe { room, subscriber } => {
                self.unsubscribe(&room, &subscriber);
            }
            BrokerRequest::Publish { room, event, data } => {
                self.publish(&room, event, data);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn rooms(&self) -> &HashMap<String, Room> {
        &self.rooms
    }
}

/// Drains the request channel, applying each request in arrival order.
///
/// This is the only task that touches broker state. It runs until every
/// handle has been dropped, i.e. for the life of the process in normal
/// operation.
pub async fn run(mut broker: Broker, mut rx: mpsc::UnboundedReceiver<BrokerRequest>) {
    while let Some(request) = rx.recv().await {
        broker.apply(request);
    }
    info!("broker request channel closed, coordinator stopping");
}

/// Cheap cloneable access to the broker task.
///
/// Handles only ever submit requests; they never observe or mutate broker
/// state directly. The request channel is unbounded so that submission never
/// blocks, which lets `unsubscribe` run inside `Drop` and keeps publishers
/// decoupled from broker scheduling.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    tx: mpsc::UnboundedSender<BrokerRequest>,
}

impl BrokerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<BrokerRequest>) -> Self {
        Self { tx }
    }

    /// Registers a subscriber in `room` and waits for its subscription.
    ///
    /// Fails only if the broker task is no longer running, which a handler
    /// surfaces as a server error for that one request.
    pub async fn subscribe(&self, room: &str) -> Result<Subscription, Error> {
        let (resp, rx) = oneshot::channel();
        self.tx
            .send(BrokerRequest::Subscribe {
                room: room.to_string(),
                resp,
            })
            .map_err(|_| Error::BrokerClosed)?;
        rx.await.map_err(|_| Error::BrokerClosed)
    }

    /// Submits an unsubscribe request. Fire-and-forget: stale and duplicate
    /// requests are no-ops on the broker side, and a closed broker means
    /// there is no state left to clean up.
    pub fn unsubscribe(&self, room: &str, subscriber: SubscriberId) {
        let _ = self.tx.send(BrokerRequest::Unsubscribe {
            room: room.to_string(),
            subscriber,
        });
    }

    /// Submits a publish request. Returns as soon as the request is queued;
    /// delivery happens on the broker task.
    pub fn publish(&self, room: &str, event: EventKind, data: String) {
        let _ = self.tx.send(BrokerRequest::Publish {
            room: room.to_string(),
            event,
            data,
        });
    }
}

/// Starts the broker task and returns a handle to it.
pub fn spawn(queue_capacity: usize) -> BrokerHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(Broker::new(queue_capacity), rx));
    BrokerHandle::new(tx)
}
