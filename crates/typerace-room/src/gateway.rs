//! The broadcast gateway: per-connection outbound queues.
//!
//! Every connected client gets an unbounded queue of [`ServerEvent`]s.
//! The connection handler drains it into the socket; the coordinator
//! pushes into it. Pushing never blocks and never fails loudly: a
//! connection that has gone away simply doesn't get the event.

use std::collections::HashMap;

use tokio::sync::mpsc;
use typerace_protocol::{ConnectionId, ServerEvent};

use crate::room::Room;

/// Sending half of a client's outbound queue.
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half of a client's outbound queue. Owned by the
/// connection handler.
pub type ClientReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Outbound queues for every connected client.
#[derive(Debug, Default)]
pub struct Gateway {
    clients: HashMap<ConnectionId, ClientSender>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a queue for `connection` and returns its receiving half.
    ///
    /// Registering the same connection again replaces the old queue.
    pub fn register(&mut self, connection: ConnectionId) -> ClientReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.clients.insert(connection, tx).is_some() {
            tracing::debug!(%connection, "connection re-registered, old queue dropped");
        }
        rx
    }

    /// Closes `connection`'s queue. Idempotent.
    pub fn unregister(&mut self, connection: ConnectionId) {
        self.clients.remove(&connection);
    }

    pub fn is_registered(&self, connection: ConnectionId) -> bool {
        self.clients.contains_key(&connection)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Sends `event` to one connection.
    pub fn to_one(&self, connection: ConnectionId, event: ServerEvent) {
        match self.clients.get(&connection) {
            Some(tx) => {
                if tx.send(event).is_err() {
                    tracing::trace!(%connection, "client queue closed, event dropped");
                }
            }
            None => tracing::trace!(%connection, "unknown connection, event dropped"),
        }
    }

    /// Sends `event` to every participant of `room`.
    pub fn to_room(&self, room: &Room, event: &ServerEvent) {
        for connection in room.connections() {
            self.to_one(connection, event.clone());
        }
    }

    /// Sends `event` to every participant of `room` except `sender`.
    pub fn to_room_except(&self, room: &Room, sender: ConnectionId, event: &ServerEvent) {
        for connection in room.connections().filter(|c| *c != sender) {
            self.to_one(connection, event.clone());
        }
    }
}
