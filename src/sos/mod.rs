//! Output to an SOS Max socket server.
//!
//! `wire` encodes messages. `SosConnection` owns the socket, its backlog
//! and the background thread that writes to it. `SosClient` is a standalone
//! front end for code that does not go through the registry. `SosTarget`
//! (in `targets`) plugs the same connection into the registry.

pub mod client;
pub mod connection;
pub mod wire;

pub use client::{client, SosClient};
pub use connection::{
    Delivery, Endpoint, SosConnection, DEFAULT_CONNECT_TIMEOUT, QUEUE_LIMIT,
};
