//! The `error` module defines the error type used across the `infocenter`
//! application.
//!
//! Almost everything the broker encounters at runtime is deliberately not an
//! error: publishing to an unknown room, unsubscribing twice, a slow
//! consumer overflowing its queue, a client hanging up. The variants below
//! cover what remains: startup problems and a broker task that is no longer
//! running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("broker is no longer running")]
    BrokerClosed,
}
