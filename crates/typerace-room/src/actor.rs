//! The coordinator actor: a single Tokio task that owns the
//! [`Coordinator`] and applies events one at a time.
//!
//! Connection handlers never touch room state directly. They hold a
//! [`CoordinatorHandle`] and send commands through a bounded mpsc
//! channel. Race deadlines report back through a second channel polled
//! in the same `select!` loop, so an expiring race is just another
//! event in the queue.

use tokio::sync::{mpsc, oneshot};
use typerace_deadline::DeadlineReceiver;
use typerace_protocol::{ConnectionId, RoomCode, RoomSnapshot};

use crate::gateway::ClientReceiver;
use crate::{Coordinator, RoomError, RoomRegistry};

/// Commands sent to the coordinator actor.
///
/// Variants with a `reply` field are request/response; the rest are
/// fire-and-forget because their outcome reaches clients through the
/// gateway.
pub(crate) enum CoordinatorCommand {
    Connect {
        connection: ConnectionId,
        reply: oneshot::Sender<ClientReceiver>,
    },
    CreateRoom {
        connection: ConnectionId,
        username: String,
    },
    JoinRoom {
        connection: ConnectionId,
        code: RoomCode,
        username: String,
    },
    PlayerReady {
        connection: ConnectionId,
        code: RoomCode,
    },
    TypingProgress {
        connection: ConnectionId,
        code: RoomCode,
        typed_text: String,
        current_index: usize,
        error_count: u32,
    },
    Disconnect {
        connection: ConnectionId,
        reply: oneshot::Sender<Vec<RoomCode>>,
    },
    Snapshot {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },
    Stats {
        reply: oneshot::Sender<CoordinatorStats>,
    },
    Shutdown,
}

/// Counters describing the coordinator's current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Live rooms.
    pub rooms: usize,
    /// Registered connections.
    pub connections: usize,
    /// Races currently running.
    pub races: usize,
}

/// Handle to the running coordinator actor.
///
/// Cheap to clone; every connection handler holds one. All methods fail
/// with [`RoomError::CoordinatorUnavailable`] once the actor has stopped.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    async fn send(&self, cmd: CoordinatorCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::CoordinatorUnavailable)
    }

    async fn request<T>(
        &self,
        cmd: impl FnOnce(oneshot::Sender<T>) -> CoordinatorCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(cmd(reply_tx)).await?;
        reply_rx.await.map_err(|_| RoomError::CoordinatorUnavailable)
    }

    /// Registers a connection. Events for it arrive on the returned queue.
    pub async fn connect(&self, connection: ConnectionId) -> Result<ClientReceiver, RoomError> {
        self.request(|reply| CoordinatorCommand::Connect { connection, reply })
            .await
    }

    pub async fn create_room(
        &self,
        connection: ConnectionId,
        username: String,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::CreateRoom {
            connection,
            username,
        })
        .await
    }

    /// Asks to join a room. A rejection is delivered to the connection
    /// as an `error` event, not returned here.
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        code: RoomCode,
        username: String,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::JoinRoom {
            connection,
            code,
            username,
        })
        .await
    }

    pub async fn player_ready(
        &self,
        connection: ConnectionId,
        code: RoomCode,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::PlayerReady { connection, code })
            .await
    }

    pub async fn typing_progress(
        &self,
        connection: ConnectionId,
        code: RoomCode,
        typed_text: String,
        current_index: usize,
        error_count: u32,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::TypingProgress {
            connection,
            code,
            typed_text,
            current_index,
            error_count,
        })
        .await
    }

    /// Reports a lost connection. Resolves once its rooms have been
    /// reconciled, with the codes of the rooms it left.
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<Vec<RoomCode>, RoomError> {
        self.request(|reply| CoordinatorCommand::Disconnect { connection, reply })
            .await
    }

    /// Current state of a room, if it exists.
    pub async fn room_snapshot(&self, code: RoomCode) -> Result<Option<RoomSnapshot>, RoomError> {
        self.request(|reply| CoordinatorCommand::Snapshot { code, reply })
            .await
    }

    pub async fn stats(&self) -> Result<CoordinatorStats, RoomError> {
        self.request(|reply| CoordinatorCommand::Stats { reply })
            .await
    }

    /// Stops the actor. Pending deadlines are cancelled.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Shutdown).await
    }
}

/// The actor state. Runs inside a Tokio task.
struct CoordinatorActor {
    coordinator: Coordinator,
    commands: mpsc::Receiver<CoordinatorCommand>,
    expired: DeadlineReceiver<RoomCode>,
}

impl CoordinatorActor {
    /// Processes commands and deadline expiries until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        tracing::info!("coordinator started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(CoordinatorCommand::Shutdown) => {
                        tracing::info!("coordinator shutting down");
                        break;
                    }
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(expired) = self.expired.recv() => {
                    self.coordinator.deadline_elapsed(&expired.key, expired.id);
                }
            }
        }

        self.coordinator.cancel_all();
        tracing::info!("coordinator stopped");
    }

    fn handle(&mut self, cmd: CoordinatorCommand) {
        let coordinator = &mut self.coordinator;
        match cmd {
            CoordinatorCommand::Connect { connection, reply } => {
                let _ = reply.send(coordinator.connect(connection));
            }
            CoordinatorCommand::CreateRoom {
                connection,
                username,
            } => {
                coordinator.create_room(connection, &username);
            }
            CoordinatorCommand::JoinRoom {
                connection,
                code,
                username,
            } => {
                // Already reported to the client as an `error` event.
                let _ = coordinator.join(&code, &username, connection);
            }
            CoordinatorCommand::PlayerReady { connection, code } => {
                coordinator.set_ready(&code, connection);
            }
            CoordinatorCommand::TypingProgress {
                connection,
                code,
                typed_text,
                current_index,
                error_count,
            } => {
                coordinator.record_progress(&code, connection, typed_text, current_index, error_count);
            }
            CoordinatorCommand::Disconnect { connection, reply } => {
                let _ = reply.send(coordinator.disconnect(connection));
            }
            CoordinatorCommand::Snapshot { code, reply } => {
                let _ = reply.send(coordinator.registry().lookup(&code).map(|r| r.snapshot()));
            }
            CoordinatorCommand::Stats { reply } => {
                let _ = reply.send(CoordinatorStats {
                    rooms: coordinator.registry().len(),
                    connections: coordinator.gateway().len(),
                    races: coordinator.active_races(),
                });
            }
            CoordinatorCommand::Shutdown => {}
        }
    }
}

/// Spawns the coordinator actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; when it fills up, senders
/// wait.
pub fn spawn_coordinator(registry: RoomRegistry, channel_size: usize) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let (coordinator, expired) = Coordinator::new(registry);

    let actor = CoordinatorActor {
        coordinator,
        commands: rx,
        expired,
    };
    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
