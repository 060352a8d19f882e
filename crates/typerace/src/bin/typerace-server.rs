//! Typerace server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin typerace-server
//! cargo run --bin typerace-server -- --ws-addr 0.0.0.0:5000 --http-addr 0.0.0.0:5001
//! ```

use std::time::Duration;

use clap::Parser;
use typerace::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "typerace-server")]
#[command(about = "Real-time multiplayer typing race server", long_about = None)]
struct Args {
    /// Address WebSocket clients connect to
    #[arg(long, env = "TYPERACE_WS_ADDR", default_value = "127.0.0.1:5000")]
    ws_addr: String,

    /// Address the HTTP API listens on
    #[arg(long, env = "TYPERACE_HTTP_ADDR", default_value = "127.0.0.1:5001")]
    http_addr: String,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds a race lasts
    #[arg(long, env = "TYPERACE_RACE_SECS", default_value_t = 60)]
    race_secs: u64,

    /// Seconds of client silence before the server pings it
    #[arg(long, default_value_t = 120)]
    idle_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig {
        ws_addr: args.ws_addr,
        http_addr: args.http_addr,
        idle_timeout: Duration::from_secs(args.idle_timeout_secs),
        race: RaceConfig {
            duration: Duration::from_secs(args.race_secs),
            ..RaceConfig::default()
        },
        ..ServerConfig::default()
    };

    let server = match TyperaceServer::builder().config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
