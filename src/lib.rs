//! # Infocenter
//!
//! `infocenter` is a room-scoped publish/subscribe broker built with Rust.
//! Short text events posted into a named room fan out to every client
//! currently holding that room's event stream open, as server-pushed frames
//! with periodic heartbeats. Rooms come into existence when their first
//! subscriber arrives and vanish when their last subscriber leaves.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `broker`: the single serialized authority over room membership and message fan-out.
//! - `session`: the per-connection loop bridging a subscription to the outbound stream.
//! - `transport`: the HTTP endpoints and the wire frame encoding.
//! - `config`: loading and merging of server configuration.
//! - `utils`: shared utilities, such as error handling and logging setup.

pub mod broker;
pub mod config;
pub mod session;
pub mod transport;
pub mod utils;
