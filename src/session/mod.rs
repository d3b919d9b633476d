//! The `session` module holds the per-connection half of the system.
//!
//! A session is created for each incoming stream request. It owns the
//! subscription handed back by the broker and runs the loop that forwards
//! inbound messages to the wire, watches for client disconnection, and
//! enforces the heartbeat timeout.

pub mod stream;
pub mod subscriber;

pub use subscriber::Subscription;

#[cfg(test)]
mod tests;
