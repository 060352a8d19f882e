//! Per-connection handler: decode frames and route them.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the coordinator → get the outbound event queue
//!   2. Spawn a writer task that drains the queue into the socket
//!   3. Loop: receive frames → decode → dispatch to the coordinator or
//!      answer solo requests directly
//!   4. On close, error, or a peer that stops answering pings → report
//!      the disconnect

use std::sync::Arc;

use tokio::time::Instant;
use typerace_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent, SoloSubmission};
use typerace_room::{ClientReceiver, CoordinatorHandle};
use typerace_solo::{NewSoloResult, SoloStore};
use typerace_transport::{Connection, WebSocketConnection};

use crate::TyperaceError;
use crate::server::ServerState;

/// Reason sent back for frames that don't decode.
pub(crate) const INVALID_MESSAGE: &str = "Invalid message";

/// Drop guard that reports the disconnect when the handler exits.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the async
/// call goes out on a spawned task.
struct DisconnectGuard {
    connection: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let connection = self.connection;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            match coordinator.disconnect(connection).await {
                Ok(rooms) => tracing::debug!(%connection, rooms = rooms.len(), "connection reconciled"),
                Err(e) => tracing::debug!(%connection, error = %e, "disconnect not delivered"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, C>>,
) -> Result<(), TyperaceError>
where
    S: SoloStore,
    C: Codec + Clone,
{
    let connection = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%connection, "handling new connection");

    let outbound = state.coordinator.connect(connection).await?;
    let _guard = DisconnectGuard {
        connection,
        coordinator: state.coordinator.clone(),
    };

    // Ends by itself once the gateway drops this connection's queue.
    tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbound,
        state.codec.clone(),
    ));

    // When this returns, `_guard` drops and reports the disconnect.
    read_loop(&conn, &state).await
}

/// Receives frames until the client goes away.
async fn read_loop<S, C>(
    conn: &WebSocketConnection,
    state: &ServerState<S, C>,
) -> Result<(), TyperaceError>
where
    S: SoloStore,
    C: Codec,
{
    let connection = conn.id();
    let idle = state.idle_timeout;
    let mut deadline = conn.last_activity() + idle;
    let mut pinged = false;

    loop {
        let data = match tokio::time::timeout_at(deadline, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%connection, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%connection, error = %e, "recv error");
                return Ok(());
            }
            Err(_) => {
                // Pings and pongs arrive inside `recv` and only move
                // `last_activity`.
                let heard = conn.last_activity() + idle;
                if heard > Instant::now() {
                    deadline = heard;
                    pinged = false;
                    continue;
                }
                if pinged {
                    tracing::info!(%connection, "peer stopped answering, closing");
                    let _ = conn.close().await;
                    return Ok(());
                }
                tracing::debug!(%connection, "connection quiet, sending ping");
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%connection, error = %e, "ping failed");
                    return Ok(());
                }
                pinged = true;
                deadline = Instant::now() + idle;
                continue;
            }
        };
        deadline = conn.last_activity() + idle;
        pinged = false;

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%connection, error = %e, "failed to decode event");
                send_event(conn, &state.codec, &ServerEvent::Error(INVALID_MESSAGE.into())).await?;
                continue;
            }
        };

        dispatch(conn, state, event).await?;
    }
}

/// Routes one decoded event.
async fn dispatch<S, C>(
    conn: &WebSocketConnection,
    state: &ServerState<S, C>,
    event: ClientEvent,
) -> Result<(), TyperaceError>
where
    S: SoloStore,
    C: Codec,
{
    let connection = conn.id();
    let coordinator = &state.coordinator;

    match event {
        ClientEvent::CreateRoom { username } => {
            coordinator.create_room(connection, username).await?;
        }
        ClientEvent::JoinRoom {
            room_code,
            username,
        } => {
            coordinator
                .join_room(connection, room_code, username)
                .await?;
        }
        ClientEvent::PlayerReady { room_code } => {
            coordinator.player_ready(connection, room_code).await?;
        }
        ClientEvent::TypingProgress {
            room_code,
            typed_text,
            current_index,
            error_count,
        } => {
            coordinator
                .typing_progress(connection, room_code, typed_text, current_index, error_count)
                .await?;
        }
        ClientEvent::GetSoloText => {
            let text = state.corpus.pick().to_string();
            send_event(conn, &state.codec, &ServerEvent::SoloTextReceived { text }).await?;
        }
        ClientEvent::SubmitSoloResult(submission) => {
            let reply = save_solo_result(&*state.store, connection, submission).await;
            send_event(conn, &state.codec, &reply).await?;
        }
    }

    Ok(())
}

/// Validates and stores a solo attempt, producing the client's reply.
async fn save_solo_result<S: SoloStore>(
    store: &S,
    connection: ConnectionId,
    submission: SoloSubmission,
) -> ServerEvent {
    let saved = match NewSoloResult::from_submission(submission) {
        Ok(record) => store.save(record).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(result) => {
            tracing::info!(%connection, username = %result.username, wpm = result.wpm, "solo result saved");
            ServerEvent::SoloResultSaved {
                success: true,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(%connection, error = %e, "solo result not saved");
            ServerEvent::SoloResultSaved {
                success: false,
                error: Some(e.client_reason().to_string()),
            }
        }
    }
}

/// Drains a connection's outbound queue into its socket.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbound: ClientReceiver,
    codec: C,
) {
    let connection = conn.id();
    while let Some(event) = outbound.recv().await {
        if let Err(e) = send_event(&conn, &codec, &event).await {
            tracing::debug!(%connection, error = %e, "send failed, writer stopping");
            break;
        }
    }
}

/// Encodes and sends one event.
async fn send_event(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    event: &ServerEvent,
) -> Result<(), TyperaceError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use typerace_solo::{InMemorySoloStore, SoloError, SoloResult};

    use super::*;

    fn submission(username: &str) -> SoloSubmission {
        SoloSubmission {
            username: username.into(),
            wpm: 55.0,
            accuracy: 96.0,
            error_count: 2,
            time_elapsed: 30.0,
        }
    }

    struct BrokenStore;

    impl SoloStore for BrokenStore {
        async fn save(&self, _result: NewSoloResult) -> Result<SoloResult, SoloError> {
            Err(SoloError::Storage("unreachable".into()))
        }

        async fn top(&self, _limit: usize) -> Result<Vec<SoloResult>, SoloError> {
            Err(SoloError::Storage("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_save_solo_result_success() {
        let store = InMemorySoloStore::new();
        let reply = save_solo_result(&store, ConnectionId::new(1), submission("Ann")).await;
        assert_eq!(
            reply,
            ServerEvent::SoloResultSaved {
                success: true,
                error: None
            }
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_solo_result_storage_failure() {
        let reply = save_solo_result(&BrokenStore, ConnectionId::new(1), submission("Ann")).await;
        assert_eq!(
            reply,
            ServerEvent::SoloResultSaved {
                success: false,
                error: Some("Database error".into())
            }
        );
    }

    #[tokio::test]
    async fn test_save_solo_result_blank_username() {
        let store = InMemorySoloStore::new();
        let reply = save_solo_result(&store, ConnectionId::new(1), submission("  ")).await;
        assert!(matches!(
            reply,
            ServerEvent::SoloResultSaved { success: false, .. }
        ));
        assert!(store.is_empty().await);
    }
}
