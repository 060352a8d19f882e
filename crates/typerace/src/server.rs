//! `TyperaceServer` builder and server loop.
//!
//! This is the entry point for running a Typerace server. It ties the
//! layers together: transport → protocol → coordinator actor, plus the
//! solo store shared by the WebSocket handlers and the HTTP routes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use typerace_protocol::JsonCodec;
use typerace_room::{CoordinatorHandle, Corpus, RaceConfig, RoomRegistry, spawn_coordinator};
use typerace_solo::{InMemorySoloStore, SoloStore};
use typerace_transport::{Transport, WebSocketTransport};

use crate::TyperaceError;
use crate::handler::handle_connection;
use crate::http;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S, C> {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) store: Arc<S>,
    pub(crate) corpus: Corpus,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Listener addresses and runtime limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Where WebSocket clients connect.
    pub ws_addr: String,
    /// Where the HTTP API listens.
    pub http_addr: String,
    /// A peer silent for this long (control frames count) is pinged, and
    /// dropped if it stays silent for as long again.
    pub idle_timeout: Duration,
    /// Capacity of the coordinator's command queue.
    pub channel_size: usize,
    /// Capacity and duration for new rooms.
    pub race: RaceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "127.0.0.1:5000".to_string(),
            http_addr: "127.0.0.1:5001".to_string(),
            idle_timeout: Duration::from_secs(120),
            channel_size: 64,
            race: RaceConfig::default(),
        }
    }
}

/// Builder for configuring and starting a Typerace server.
///
/// # Example
///
/// ```rust,no_run
/// use typerace::prelude::*;
///
/// # async fn run() -> Result<(), TyperaceError> {
/// let server = TyperaceServer::builder()
///     .ws_addr("0.0.0.0:5000")
///     .http_addr("0.0.0.0:5001")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TyperaceServerBuilder {
    config: ServerConfig,
    corpus: Corpus,
}

impl TyperaceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the WebSocket bind address.
    pub fn ws_addr(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the HTTP bind address.
    pub fn http_addr(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Sets how long a silent peer goes before it is pinged.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn channel_size(mut self, size: usize) -> Self {
        self.config.channel_size = size;
        self
    }

    /// Sets capacity and race duration for new rooms.
    pub fn race_config(mut self, race: RaceConfig) -> Self {
        self.config.race = race;
        self
    }

    /// Sets the passages races and solo runs are drawn from.
    pub fn corpus(mut self, corpus: Corpus) -> Self {
        self.corpus = corpus;
        self
    }

    /// Binds both listeners and starts the coordinator, keeping solo
    /// results in memory.
    pub async fn build(self) -> Result<TyperaceServer<InMemorySoloStore>, TyperaceError> {
        self.build_with_store(InMemorySoloStore::new()).await
    }

    /// Like [`build`](Self::build), with a custom solo store.
    pub async fn build_with_store<S: SoloStore>(
        self,
        store: S,
    ) -> Result<TyperaceServer<S>, TyperaceError> {
        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;
        let http = TcpListener::bind(&self.config.http_addr).await?;

        let registry = RoomRegistry::new(self.corpus.clone(), self.config.race.clone());
        let coordinator = spawn_coordinator(registry, self.config.channel_size);

        let state = Arc::new(ServerState {
            coordinator,
            store: Arc::new(store),
            corpus: self.corpus,
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(TyperaceServer {
            transport,
            http,
            state,
        })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Typerace server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TyperaceServer<S: SoloStore> {
    transport: WebSocketTransport,
    http: TcpListener,
    state: Arc<ServerState<S, JsonCodec>>,
}

impl TyperaceServer<InMemorySoloStore> {
    /// Creates a new builder.
    pub fn builder() -> TyperaceServerBuilder {
        TyperaceServerBuilder::new()
    }
}

impl<S: SoloStore> TyperaceServer<S> {
    /// The address WebSocket clients connect to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The address the HTTP API is served on.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    /// A handle to the running coordinator.
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.state.coordinator
    }

    /// Runs the server until the process is terminated.
    pub async fn run(self) -> Result<(), TyperaceError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the server until `shutdown` resolves.
    ///
    /// Serves the HTTP API in a background task and spawns a handler
    /// task per accepted WebSocket connection. On shutdown the
    /// coordinator is stopped, which cancels every pending race deadline.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), TyperaceError>
    where
        F: Future<Output = ()> + Send,
    {
        let ws_addr = self.local_addr()?;
        let http_addr = self.http_addr()?;
        let Self {
            mut transport,
            http: listener,
            state,
        } = self;

        let router = http::router(Arc::clone(&state.store));
        let http_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "http server stopped");
            }
        });

        tracing::info!(%ws_addr, %http_addr, "Typerace server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                accepted = transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        http_task.abort();
        if state.coordinator.shutdown().await.is_err() {
            tracing::debug!("coordinator already stopped");
        }
        tracing::info!("Typerace server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.ws_addr, "127.0.0.1:5000");
        assert_eq!(config.http_addr, "127.0.0.1:5001");
        assert_eq!(config.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.race, RaceConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let builder = TyperaceServerBuilder::new()
            .ws_addr("0.0.0.0:9000")
            .http_addr("0.0.0.0:9001")
            .idle_timeout(Duration::from_secs(5))
            .channel_size(8);
        assert_eq!(builder.config.ws_addr, "0.0.0.0:9000");
        assert_eq!(builder.config.http_addr, "0.0.0.0:9001");
        assert_eq!(builder.config.idle_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.channel_size, 8);
    }
}
