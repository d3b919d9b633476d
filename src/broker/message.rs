use std::fmt;
use std::time::Duration;

/// The closed set of event kinds a stream can carry.
///
/// `Message` is an application payload published into a room; `Timeout` is
/// the synthetic heartbeat frame a session emits before forcing the client
/// to reconnect. The broker forwards payload data untouched, but sessions do
/// interpret the kind: a `Timeout` arriving on a subscriber queue ends that
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Timeout,
}

impl EventKind {
    /// Wire name of the kind, as written on the `event:` line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event delivered to subscribers of a room.
///
/// # Fields
///
/// - `id` - Broker-wide sequence number, assigned when the message is
///   published. Ids are strictly increasing across all rooms and never
///   reused.
/// - `event` - The kind of event (`message` or `timeout`).
/// - `data` - Opaque payload content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub event: EventKind,
    pub data: String,
}

impl Message {
    /// Builds the heartbeat frame a session emits when a subscriber has seen
    /// no traffic for a full heartbeat interval. It carries id 0: heartbeats
    /// are per-connection and never enter the published sequence.
    pub fn timeout(heartbeat: Duration) -> Self {
        Self {
            id: 0,
            event: EventKind::Timeout,
            data: format!("{}s", heartbeat.as_secs()),
        }
    }
}
